//! Options for building a configuration manager
//!
//! Defaults: search `<cwd>/configs` for `default.toml` then `<hostname>.toml`,
//! root node named `Configuration`, empty containers skipped, no logger.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::diagnostics::DiagnosticSink;
use crate::domain::MergePolicy;
use crate::infrastructure::{FileSystem, FormatLoader, RealFileSystem, SourceLoader};

/// Directory searched when none is configured, relative to the cwd.
pub const DEFAULT_CONFIG_DIR: &str = "configs";

/// File merged first in every search directory.
pub const DEFAULT_FILE_NAME: &str = "default.toml";

/// Placeholder replaced by the local hostname in file names.
pub const HOSTNAME_PLACEHOLDER: &str = "{hostname}";

/// Name of the root node, first segment of every diagnostic path.
pub const DEFAULT_ROOT_NAME: &str = "Configuration";

/// Search directories and file names of the cascade, plus collaborators.
#[derive(Clone)]
pub struct ManagerOptions {
    search_dirs: Vec<PathBuf>,
    file_names: Vec<String>,
    hostname: Option<String>,
    root_name: String,
    policy: MergePolicy,
    logger: Option<Arc<dyn DiagnosticSink>>,
    fs: Arc<dyn FileSystem>,
    loader: Arc<dyn SourceLoader>,
}

impl fmt::Debug for ManagerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerOptions")
            .field("search_dirs", &self.search_dirs)
            .field("file_names", &self.file_names)
            .field("hostname", &self.hostname)
            .field("root_name", &self.root_name)
            .field("policy", &self.policy)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Default for ManagerOptions {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        Self {
            search_dirs: vec![cwd.join(DEFAULT_CONFIG_DIR)],
            file_names: default_file_names(),
            hostname: local_hostname(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            policy: MergePolicy::default(),
            logger: None,
            loader: Arc::new(FormatLoader::new(Arc::clone(&fs))),
            fs,
        }
    }
}

/// `default.toml` followed by `{hostname}.toml`.
pub fn default_file_names() -> Vec<String> {
    vec![
        DEFAULT_FILE_NAME.to_string(),
        format!("{}.toml", HOSTNAME_PLACEHOLDER),
    ]
}

/// Local hostname, if it can be determined.
pub fn local_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Substitute `{hostname}` in a file name.
///
/// Returns `None` when the name needs a hostname and none is available.
pub fn resolve_file_name(name: &str, hostname: Option<&str>) -> Option<String> {
    if !name.contains(HOSTNAME_PLACEHOLDER) {
        return Some(name.to_string());
    }
    match hostname {
        Some(host) => Some(name.replace(HOSTNAME_PLACEHOLDER, host)),
        None => {
            debug!("no hostname available, skipping file name '{}'", name);
            None
        }
    }
}

impl ManagerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_file_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Hostname substituted for `{hostname}` in file names.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn DiagnosticSink>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Swap the filesystem; the loader is rebuilt on top of it.
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.loader = Arc::new(FormatLoader::new(Arc::clone(&fs)));
        self.fs = fs;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn SourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// File names with `{hostname}` substituted, unresolvable ones dropped.
    pub fn resolved_file_names(&self) -> Vec<String> {
        self.file_names
            .iter()
            .filter_map(|name| resolve_file_name(name, self.hostname()))
            .collect()
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn logger(&self) -> Option<&Arc<dyn DiagnosticSink>> {
        self.logger.as_ref()
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn loader(&self) -> &Arc<dyn SourceLoader> {
        &self.loader
    }
}
