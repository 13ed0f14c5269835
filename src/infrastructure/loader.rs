//! Source file loader for TOML and JSON
//!
//! The format is picked from the file extension. The top level of a source
//! file is its set of exported configuration variables.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::domain::RawValue;
use crate::infrastructure::error::{IoResultExt, LoadError, LoadResult};
use crate::infrastructure::traits::{FileSystem, RealFileSystem, SourceLoader};

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    /// Parse `content` into a raw structure.
    pub fn parse(&self, content: &str) -> Result<RawValue, String> {
        match self {
            Format::Toml => toml::from_str::<toml::Value>(content)
                .map(RawValue::from)
                .map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str::<serde_json::Value>(content)
                .map(RawValue::from)
                .map_err(|e| e.to_string()),
        }
    }
}

/// Loads `.toml` and `.json` files through a `FileSystem`.
pub struct FormatLoader {
    fs: Arc<dyn FileSystem>,
}

impl Default for FormatLoader {
    fn default() -> Self {
        Self::new(Arc::new(RealFileSystem))
    }
}

impl FormatLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl SourceLoader for FormatLoader {
    fn load(&self, path: &Path) -> LoadResult<RawValue> {
        let format =
            Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
        let content = self.fs.read_to_string(path).with_path(path)?;
        debug!("load: {} ({:?}, {} bytes)", path.display(), format, content.len());
        format.parse(&content).map_err(|message| LoadError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn given_extensions_when_detecting_format_then_matches() {
        assert_eq!(Format::from_path(Path::new("a/default.toml")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("host.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("default.ini")), None);
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn given_unknown_extension_when_loading_then_unsupported() {
        let loader = FormatLoader::default();

        let result = loader.load(Path::new("/nowhere/default.ini"));

        assert!(matches!(result, Err(LoadError::UnsupportedFormat(p)) if p == PathBuf::from("/nowhere/default.ini")));
    }

    #[test]
    fn given_missing_file_when_loading_then_io_error() {
        let loader = FormatLoader::default();

        let result = loader.load(Path::new("/nonexistent/cascade/default.toml"));

        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn given_invalid_json_when_parsing_then_error_message() {
        assert!(Format::Json.parse("{not json").is_err());
        assert!(Format::Toml.parse("= broken").is_err());
    }
}
