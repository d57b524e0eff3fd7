//! Diagnostic sink for contained failures.
//!
//! The dispatch core reports every per-file failure twice: in the returned
//! mapping and through a [`Diagnostics`] sink handed to it at construction.
//! [`LogDiagnostics`] forwards to the `log` facade, so whatever logger the
//! binary installed (console, file, both) receives the messages.

use std::sync::Mutex;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Progress information
    Info,
    /// Recoverable condition (retry, unavailable target, encrypted PDF)
    Warning,
    /// Contained per-file failure
    Error,
}

/// Receiver for diagnostic messages.
pub trait Diagnostics: Send + Sync {
    /// Record one message.
    fn report(&self, severity: Severity, message: &str);

    /// Record an informational message.
    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    /// Record a warning.
    fn warn(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    /// Record a contained failure.
    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }
}

/// Forwards diagnostics to the `log` crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => log::info!("{message}"),
            Severity::Warning => log::warn!("{message}"),
            Severity::Error => log::error!("{message}"),
        }
    }
}

/// Keeps every message in memory. Useful in tests and for embedding.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    records: Mutex<Vec<(Severity, String)>>,
}

impl MemoryDiagnostics {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded messages, in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<(Severity, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at the given severity.
    #[must_use]
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn report(&self, severity: Severity, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((severity, message.to_string()));
        }
    }
}
