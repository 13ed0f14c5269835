//! Application layer: the configuration manager
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod diagnostics;
pub mod error;
pub mod manager;
pub mod options;

pub use diagnostics::{DiagnosticSink, TracingSink};
pub use error::{ApplicationError, ApplicationResult};
pub use manager::{ConfigManager, PATHS_KEY};
pub use options::ManagerOptions;
