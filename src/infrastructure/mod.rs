//! Infrastructure layer: I/O implementations
//!
//! This layer implements the I/O boundary traits the application layer
//! depends on: filesystem access and source file loading.

pub mod error;
pub mod loader;
pub mod traits;

pub use error::{InfraError, IoResultExt, LoadError, LoadResult};
pub use loader::FormatLoader;
pub use traits::{FileSystem, RealFileSystem, SourceLoader};
