//! Diagnostic sink for misses and unreadable sources
//!
//! The manager reports through an optional sink; without one, diagnostics
//! are dropped.

/// Receives diagnostic messages.
pub trait DiagnosticSink: Send + Sync {
    fn error(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn error(&self, message: &str) {
        tracing::error!(target: "cascade_config::diagnostics", "{}", message);
    }
}

/// Message for a read of a key that is absent or empty.
pub fn not_set_message(path: &str) -> String {
    format!(
        "A request for a configuration option '{}' was attempted but it has not been set.",
        path
    )
}

/// Message for a source file that could not be loaded.
pub fn load_failed_message(path: &std::path::Path) -> String {
    format!("Failed to load configuration file {}", path.display())
}
