//! Configuration manager
//!
//! Loads the cascade (directories x file names), merges every readable
//! source into one tree and serves keyed reads with diagnostics on misses.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::application::diagnostics::{load_failed_message, not_set_message};
use crate::application::options::ManagerOptions;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    ConfigTree, DomainError, Entry, KeyPath, MergeEngine, NodeRef, RawValue, Source,
};

/// Reserved key recording the search directories of the initial load.
pub const PATHS_KEY: &str = "configurationPaths";

/// Merged configuration and the options it was loaded with.
#[derive(Debug)]
pub struct ConfigManager {
    tree: ConfigTree,
    engine: MergeEngine,
    options: ManagerOptions,
    files: Vec<PathBuf>,
}

impl ConfigManager {
    /// Create a manager with an empty tree; nothing is loaded.
    pub fn new(options: ManagerOptions) -> Self {
        Self {
            tree: ConfigTree::new(options.root_name()),
            engine: MergeEngine::new(options.policy()),
            options,
            files: Vec::new(),
        }
    }

    /// Create a manager and load the configured cascade.
    ///
    /// After loading, `configurationPaths` lists the search directories.
    #[instrument(level = "debug", skip_all)]
    pub fn load(options: ManagerOptions) -> Self {
        let mut manager = Self::new(options);
        let dirs = manager.options.search_dirs().to_vec();
        let names = manager.options.resolved_file_names();

        manager.build_configuration(&dirs, &names);

        let paths: Vec<RawValue> = dirs
            .iter()
            .map(|dir| RawValue::String(dir.display().to_string()))
            .collect();
        let root = manager.tree.root();
        if paths.is_empty() {
            manager.tree.set_value(root, PATHS_KEY, RawValue::List(paths));
        } else {
            manager
                .engine
                .merge_into(&mut manager.tree, root, PATHS_KEY, &RawValue::List(paths));
        }
        manager
    }

    /// Candidate files in cascade order: directories outer, names inner.
    ///
    /// Only existing, readable files are returned.
    pub fn build_file_list(&self, dirs: &[PathBuf], names: &[String]) -> Vec<PathBuf> {
        let fs = self.options.fs();
        dirs.iter()
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .filter(|path| fs.is_file(path) && fs.is_readable(path))
            .collect()
    }

    /// Merge the files found in `dirs` x `names` on top of the current tree.
    ///
    /// Returns how many files were merged.
    pub fn build_configuration(&mut self, dirs: &[PathBuf], names: &[String]) -> usize {
        let files = self.build_file_list(dirs, names);
        debug!("build_configuration: {} candidate files", files.len());
        self.parse_files(&files)
    }

    /// Merge one extra file on top of everything loaded so far.
    pub fn push_file(&mut self, path: &Path) -> bool {
        self.parse_files(&[path.to_path_buf()]) == 1
    }

    /// Merge extra files in order; returns how many were merged.
    pub fn push_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        self.parse_files(&paths)
    }

    /// Merge an already-parsed source on top of the tree.
    pub fn push_source(&mut self, source: &Source) -> bool {
        self.engine.merge_source(&mut self.tree, source)
    }

    fn parse_files(&mut self, files: &[PathBuf]) -> usize {
        let mut merged = 0;
        for file in files {
            let fs = self.options.fs();
            if !fs.is_file(file) || !fs.is_readable(file) {
                debug!("parse_files: not a readable file: {}", file.display());
                self.report(&load_failed_message(file));
                continue;
            }

            let value = match self.options.loader().load(file) {
                Ok(value) => value,
                Err(e) => {
                    debug!("parse_files: {}", e);
                    self.report(&load_failed_message(file));
                    continue;
                }
            };

            let source = Source::new(file.as_path(), value);
            self.engine.merge_source(&mut self.tree, &source);
            self.files.push(file.clone());
            merged += 1;
        }
        merged
    }

    /// Files merged so far, in merge order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// Value under a dotted `key`, or `None` when it is absent or empty.
    ///
    /// `false`, `0`, `""` and empty lists count as not set. A miss is
    /// reported to the logger with the path up to the failing segment.
    /// Keys that themselves contain `.` are reachable through `get_path`.
    pub fn get(&self, key: &str) -> Option<Entry<'_>> {
        match KeyPath::parse(key) {
            Ok(key_path) => self.get_path(key_path.segments()),
            Err(_) => {
                self.report(&not_set_message(&self.table().path(Some(key))));
                None
            }
        }
    }

    /// Like `get`, with the key given as segments; segments are taken as-is.
    pub fn get_path(&self, segments: &[&str]) -> Option<Entry<'_>> {
        let table = self.table();
        let Some((&last, parents)) = segments.split_last() else {
            self.report(&not_set_message(&table.path(None)));
            return None;
        };

        let mut node = table;
        for &segment in parents {
            match node.get(segment) {
                Some(Entry::Node(child)) => node = child,
                _ => {
                    self.report(&not_set_message(&node.path(Some(segment))));
                    return None;
                }
            }
        }

        match node.get(last) {
            Some(entry) if !entry.is_empty_value() => Some(entry),
            _ => {
                self.report(&not_set_message(&node.path(Some(last))));
                None
            }
        }
    }

    /// Like `get`, but a miss is an error.
    pub fn require(&self, key: &str) -> Result<Entry<'_>, DomainError> {
        self.get(key).ok_or_else(|| DomainError::NotSet {
            path: key.to_string(),
        })
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|entry| entry.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|entry| entry.as_i64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|entry| entry.as_bool())
    }

    pub fn get_list(&self, key: &str) -> Option<&[RawValue]> {
        self.get(key).and_then(|entry| entry.as_list())
    }

    /// Deserialize the value under `key` into `T`.
    pub fn extract<T: DeserializeOwned>(&self, key: &str) -> ApplicationResult<T> {
        let raw = self.require(key)?.to_raw();
        Self::deserialize(key, raw)
    }

    /// Deserialize the whole flattened tree into `T`.
    pub fn extract_all<T: DeserializeOwned>(&self) -> ApplicationResult<T> {
        Self::deserialize(self.options.root_name(), self.flatten())
    }

    fn deserialize<T: DeserializeOwned>(key: &str, raw: RawValue) -> ApplicationResult<T> {
        serde_json::to_value(raw)
            .and_then(serde_json::from_value::<T>)
            .map_err(|source| ApplicationError::Extract {
                key: key.to_string(),
                source,
            })
    }

    /// Write `value` under a dotted `key`, replacing what was there.
    ///
    /// No merge semantics: lists are not appended and maps are not deep
    /// merged. Missing or non-branch intermediate segments become branches.
    pub fn set(&mut self, key: &str, value: impl Into<RawValue>) -> Result<(), DomainError> {
        let key_path = KeyPath::parse(key)?;
        self.set_path(key_path.segments(), value)
    }

    /// Like `set`, with the key given as segments; every segment must be non-empty.
    pub fn set_path(
        &mut self,
        segments: &[&str],
        value: impl Into<RawValue>,
    ) -> Result<(), DomainError> {
        let invalid = || DomainError::InvalidKey(segments.join("."));
        let Some((&last, parents)) = segments.split_last() else {
            return Err(invalid());
        };
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }

        let mut node = self.tree.root();
        for &segment in parents {
            node = self.tree.ensure_branch(node, segment).ok_or_else(invalid)?;
        }
        self.tree
            .set_value(node, last, value.into())
            .map(|_| ())
            .ok_or_else(invalid)
    }

    /// True when `key` exists and is not null.
    ///
    /// Does not apply the emptiness check of `get`: a key set to `false`
    /// is present here but not set for `get`.
    pub fn has(&self, key: &str) -> bool {
        KeyPath::parse(key).is_ok_and(|key_path| self.has_path(key_path.segments()))
    }

    /// Like `has`, with the key given as segments.
    pub fn has_path(&self, segments: &[&str]) -> bool {
        let Some((&last, parents)) = segments.split_last() else {
            return false;
        };
        let mut node = self.table();
        for &segment in parents {
            match node.get(segment) {
                Some(Entry::Node(child)) => node = child,
                _ => return false,
            }
        }
        node.has(last)
    }

    /// Plain nested value of the whole configuration.
    pub fn flatten(&self) -> RawValue {
        self.tree.flatten()
    }

    /// Root node.
    pub fn table(&self) -> NodeRef<'_> {
        self.tree.root_ref()
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    fn report(&self, message: &str) {
        if let Some(logger) = self.options.logger() {
            logger.error(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::RecordingSink;
    use std::sync::Arc;

    fn manager_with_sink() -> (ConfigManager, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let options = ManagerOptions::new()
            .with_search_dirs(Vec::<PathBuf>::new())
            .with_logger(sink.clone());
        (ConfigManager::new(options), sink)
    }

    #[test]
    fn given_set_false_when_reading_then_has_but_not_get() {
        let (mut manager, sink) = manager_with_sink();

        manager.set("flag", false).unwrap();

        assert!(manager.has("flag"));
        assert!(manager.get("flag").is_none());
        assert_eq!(
            sink.messages(),
            vec![
                "A request for a configuration option 'Configuration->flag' was attempted but it has not been set."
            ]
        );
    }

    #[test]
    fn given_null_when_checking_has_then_false() {
        let (mut manager, _) = manager_with_sink();

        manager.set("nothing", RawValue::Null).unwrap();

        assert!(!manager.has("nothing"));
    }

    #[test]
    fn given_missing_intermediate_when_getting_then_reports_failing_segment() {
        let (mut manager, sink) = manager_with_sink();
        manager.set("helmet.value.option", "geezer").unwrap();

        assert!(manager.get("helmet.nope.option").is_none());
        assert!(manager.get("helmet.value.option.deeper").is_none());

        assert_eq!(
            sink.messages(),
            vec![
                not_set_message("Configuration->helmet->nope"),
                not_set_message("Configuration->helmet->value->option"),
            ]
        );
    }

    #[test]
    fn given_no_logger_when_missing_then_silent_none() {
        let options = ManagerOptions::new().with_search_dirs(Vec::<PathBuf>::new());
        let manager = ConfigManager::new(options);

        assert!(manager.get("absent").is_none());
    }

    #[test]
    fn given_invalid_key_when_setting_then_error() {
        let (mut manager, _) = manager_with_sink();

        assert_eq!(
            manager.set("a..b", 1),
            Err(DomainError::InvalidKey("a..b".to_string()))
        );
        assert!(!manager.has("a..b"));
    }

    #[test]
    fn given_scalar_when_setting_nested_key_then_replaces_with_branch() {
        let (mut manager, _) = manager_with_sink();
        manager.set("db", "sqlite").unwrap();

        manager.set("db.port", 5432).unwrap();

        assert_eq!(manager.get_i64("db.port"), Some(5432));
    }

    #[test]
    fn given_set_list_when_setting_again_then_replaces_not_appends() {
        let (mut manager, _) = manager_with_sink();

        manager.set("list", vec![1, 2]).unwrap();
        manager.set("list", vec![3]).unwrap();

        assert_eq!(manager.get_list("list"), Some(&[RawValue::Integer(3)][..]));
    }

    #[test]
    fn given_empty_search_dirs_when_loading_then_paths_key_present() {
        let options = ManagerOptions::new().with_search_dirs(Vec::<PathBuf>::new());

        let manager = ConfigManager::load(options);

        assert!(manager.has(PATHS_KEY));
        assert!(manager.files().is_empty());
    }

    #[test]
    fn given_section_when_extracting_then_deserializes() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Db {
            host: String,
            port: u16,
        }
        let (mut manager, _) = manager_with_sink();
        let db = RawValue::from_pairs([
            ("host", RawValue::from("localhost")),
            ("port", RawValue::from(5432)),
        ]);
        manager.set("db", db).unwrap();

        let db: Db = manager.extract("db").unwrap();

        assert_eq!(
            db,
            Db {
                host: "localhost".into(),
                port: 5432
            }
        );
        assert!(matches!(
            manager.extract::<Db>("missing"),
            Err(ApplicationError::Domain(DomainError::NotSet { .. }))
        ));
        assert!(matches!(
            manager.extract::<u8>("db.host"),
            Err(ApplicationError::Extract { .. })
        ));
    }

    #[test]
    fn given_tree_when_extracting_all_then_deserializes_root() {
        #[derive(serde::Deserialize, Debug)]
        struct Root {
            name: String,
            #[serde(rename = "configurationPaths")]
            paths: Vec<String>,
        }
        let options = ManagerOptions::new().with_search_dirs(Vec::<PathBuf>::new());
        let mut manager = ConfigManager::load(options);
        manager.set("name", "app").unwrap();

        let root: Root = manager.extract_all().unwrap();

        assert_eq!(root.name, "app");
        assert!(root.paths.is_empty());
    }

    #[test]
    fn given_key_containing_dot_when_using_segments_then_reachable() {
        let (mut manager, sink) = manager_with_sink();
        let source = Source::new(
            "hosts.toml",
            RawValue::from_pairs([
                ("db.host", RawValue::from("x")),
                (
                    "hosts",
                    RawValue::from_pairs([("a.example.com", RawValue::from(1))]),
                ),
            ]),
        );
        assert!(manager.push_source(&source));

        assert_eq!(
            manager.get_path(&["db.host"]).and_then(|e| e.as_str()),
            Some("x")
        );
        assert!(manager.has_path(&["hosts", "a.example.com"]));
        assert_eq!(
            manager
                .get_path(&["hosts", "a.example.com"])
                .and_then(|e| e.as_i64()),
            Some(1)
        );
        assert!(!manager.has("db.host"));
        assert!(sink.messages().is_empty());

        manager.set_path(&["hosts", "b.example.com"], 2).unwrap();
        assert_eq!(
            manager
                .get_path(&["hosts", "b.example.com"])
                .and_then(|e| e.as_i64()),
            Some(2)
        );
    }

    #[test]
    fn given_empty_segments_when_using_paths_then_rejected() {
        let (mut manager, _) = manager_with_sink();

        assert!(manager.get_path(&[]).is_none());
        assert!(!manager.has_path(&[]));
        assert_eq!(
            manager.set_path(&["a", ""], 1),
            Err(DomainError::InvalidKey("a.".to_string()))
        );
    }
}
