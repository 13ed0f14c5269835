//! Infrastructure-level errors (wraps application errors)

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::application::ApplicationError;

/// Failure to turn a source file into a raw structure.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Result type for source loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Extension trait for converting `io::Result` to `LoadResult` with path context.
pub trait IoResultExt<T> {
    /// Attach the path the I/O operation was working on.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&path).with_path(&path)?;
    /// ```
    fn with_path(self, path: &Path) -> LoadResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: &Path) -> LoadResult<T> {
        self.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
