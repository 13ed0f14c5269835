//! Cascading configuration
//!
//! An ordered list of directories crossed with an ordered list of file
//! names yields the sources of one configuration tree. Later sources
//! override earlier ones: keyed maps are merged deeply, lists are
//! appended, scalars are replaced.
//!
//! ```no_run
//! use cascade_config::{ConfigManager, ManagerOptions};
//!
//! let manager = ConfigManager::load(
//!     ManagerOptions::new().with_search_dirs(["/etc/app", "/srv/site"]),
//! );
//! let host = manager.get_str("database.host");
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;

pub mod util {
    pub mod testing;
}

pub use application::{ConfigManager, DiagnosticSink, ManagerOptions, TracingSink, PATHS_KEY};
pub use domain::{
    ConfigTree, EmptyContainerPolicy, Entry, MergeEngine, MergePolicy, NodeRef, RawMap, RawValue,
    Source, SourceId,
};
