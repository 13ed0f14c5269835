//! Settings for the `cascade` tool itself, with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/cascade/cascade.toml`
//! 3. Local config: `<project_dir>/.cascade.toml`
//! 4. Environment variables: `CASCADE_*` prefix

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::options::{default_file_names, DEFAULT_CONFIG_DIR, DEFAULT_ROOT_NAME};
use crate::application::{ApplicationError, ManagerOptions, TracingSink};
use crate::domain::{expand_env_vars, EmptyContainerPolicy, MergePolicy};

/// Unified configuration for cascade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directories searched in order, later ones override earlier ones
    pub search_dirs: Vec<PathBuf>,
    /// File names tried in every directory; `{hostname}` is substituted
    pub file_names: Vec<String>,
    /// Name of the root node in diagnostic paths
    pub root_name: String,
    /// How an empty list/map is merged: `skip`, `clear` or `append`
    pub empty_containers: EmptyContainerPolicy,
    /// Report misses and unreadable files through the log
    pub diagnostics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from(DEFAULT_CONFIG_DIR)],
            file_names: default_file_names(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            empty_containers: EmptyContainerPolicy::default(),
            diagnostics: true,
        }
    }
}

/// Raw settings for intermediate parsing (Option to detect "not specified").
///
/// Used during layered merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub search_dirs: Option<Vec<String>>,
    pub file_names: Option<Vec<String>>,
    pub root_name: Option<String>,
    pub empty_containers: Option<EmptyContainerPolicy>,
    pub diagnostics: Option<bool>,
}

/// Get the XDG config directory for cascade.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cascade").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("cascade.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".cascade.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Append overlay items to base, keeping order.
///
/// - Items already present are not repeated
/// - Items prefixed with `!` remove the corresponding item
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: Vec<String> = base.to_vec();
    for item in overlay {
        if let Some(negated) = item.strip_prefix('!') {
            result.retain(|existing| existing != negated);
        } else if !result.contains(item) {
            result.push(item.clone());
        }
    }
    result
}

fn paths_to_strings(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.to_string_lossy().into_owned()).collect()
}

impl Settings {
    /// Expand shell variables and tilde in search directories.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        self.search_dirs = self
            .search_dirs
            .iter()
            .map(|dir| PathBuf::from(expand_env_vars(dir.to_string_lossy().as_ref())))
            .collect();
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    ///
    /// Defaults are just examples; the global config defines the baseline.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            search_dirs: global
                .search_dirs
                .as_ref()
                .map(|dirs| dirs.iter().map(PathBuf::from).collect())
                .unwrap_or_else(|| self.search_dirs.clone()),
            file_names: global
                .file_names
                .clone()
                .unwrap_or_else(|| self.file_names.clone()),
            root_name: global
                .root_name
                .clone()
                .unwrap_or_else(|| self.root_name.clone()),
            empty_containers: global.empty_containers.unwrap_or(self.empty_containers),
            diagnostics: global.diagnostics.unwrap_or(self.diagnostics),
        }
    }

    /// Merge local config onto self with ordered-append semantics for arrays.
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Arrays: appended in order, `!item` removes an inherited item
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            search_dirs: overlay
                .search_dirs
                .as_ref()
                .map(|o| {
                    merge_array(&paths_to_strings(&self.search_dirs), o)
                        .into_iter()
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_else(|| self.search_dirs.clone()),
            file_names: overlay
                .file_names
                .as_ref()
                .map(|o| merge_array(&self.file_names, o))
                .unwrap_or_else(|| self.file_names.clone()),
            root_name: overlay
                .root_name
                .clone()
                .unwrap_or_else(|| self.root_name.clone()),
            empty_containers: overlay.empty_containers.unwrap_or(self.empty_containers),
            diagnostics: overlay.diagnostics.unwrap_or(self.diagnostics),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.cascade.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: ordered APPEND with `!item` removal
    /// - Any → Env vars: REPLACE
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply CASCADE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("CASCADE")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("search_dirs")
                    .with_list_parse_key("file_names"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<Vec<String>>("search_dirs") {
            settings.search_dirs = val.into_iter().map(PathBuf::from).collect();
        }
        if let Ok(val) = config.get::<Vec<String>>("file_names") {
            settings.file_names = val;
        }
        if let Ok(val) = config.get_string("root_name") {
            settings.root_name = val;
        }
        if let Ok(val) = config.get_string("empty_containers") {
            settings.empty_containers = match val.to_lowercase().as_str() {
                "skip" => EmptyContainerPolicy::Skip,
                "clear" => EmptyContainerPolicy::Clear,
                "append" => EmptyContainerPolicy::Append,
                other => {
                    return Err(ApplicationError::Config {
                        message: format!("CASCADE_EMPTY_CONTAINERS: unknown policy '{other}'"),
                    })
                }
            };
        }
        if let Ok(val) = config.get_bool("diagnostics") {
            settings.diagnostics = val;
        }

        Ok(settings)
    }

    /// Manager options for these settings.
    ///
    /// Relative search directories are resolved against `base_dir`.
    pub fn manager_options(&self, base_dir: &Path) -> ManagerOptions {
        let dirs: Vec<PathBuf> = self
            .search_dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    base_dir.join(dir)
                }
            })
            .collect();
        let options = ManagerOptions::new()
            .with_search_dirs(dirs)
            .with_file_names(self.file_names.clone())
            .with_root_name(self.root_name.clone())
            .with_policy(MergePolicy {
                empty_containers: self.empty_containers,
            });
        if self.diagnostics {
            options.with_logger(Arc::new(TracingSink))
        } else {
            options
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# cascade configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/cascade/cascade.toml  (defines your baseline)
#   Local:  <project>/.cascade.toml         (project-specific additions)
#   Env:    CASCADE_* environment variables (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config APPENDS to global, keeping order.
#   Use "!item" in local config to REMOVE an inherited item:
#     search_dirs = ["overrides", "!configs"]

# Directories searched in order; later directories override earlier ones
# search_dirs = ["configs"]

# File names tried in each directory; {hostname} is the local hostname
# file_names = ["default.toml", "{hostname}.toml"]

# Root segment of diagnostic paths
# root_name = "Configuration"

# Empty list/map in a later source: "skip" keeps the prior value, "clear" resets it,
# "append" keeps a prior list and turns anything else into an empty list
# empty_containers = "skip"

# Log misses and unreadable files
# diagnostics = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
