//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing the manager
//! to be tested with in-memory implementations.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::domain::RawValue;
use crate::infrastructure::error::LoadResult;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if the file can be opened for reading.
    fn is_readable(&self, path: &Path) -> bool;
}

/// Turns one source file into a raw structure.
///
/// A loader never touches the tree: a file either yields a complete value
/// or an error, so a bad file cannot leave a partial merge behind.
pub trait SourceLoader: Send + Sync {
    fn load(&self, path: &Path) -> LoadResult<RawValue>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_readable(&self, path: &Path) -> bool {
        File::open(path).is_ok()
    }
}
