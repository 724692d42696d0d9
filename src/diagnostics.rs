//! Diagnostic sink for degraded-but-valid outcomes.
//!
//! The log pipeline never fails on odd response shapes or bad filter text.
//! It reports them here instead, so callers decide where they end up.

use log::{error, info, warn};
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Component that produced the diagnostic, e.g. `"filter"`.
    pub context: &'static str,
    pub message: String,
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);

    fn note(&self, context: &'static str, message: String) {
        self.emit(Diagnostic {
            severity: Severity::Note,
            context,
            message,
        });
    }

    fn warning(&self, context: &'static str, message: String) {
        self.emit(Diagnostic {
            severity: Severity::Warning,
            context,
            message,
        });
    }

    fn error(&self, context: &'static str, message: String) {
        self.emit(Diagnostic {
            severity: Severity::Error,
            context,
            message,
        });
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let target = match diagnostic.context {
            "normalize" => "routeros_probe::normalize",
            "filter" => "routeros_probe::filter",
            "logs" => "routeros_probe::logs",
            "ip" => "routeros_probe::ip",
            "system" => "routeros_probe::system",
            _ => "routeros_probe",
        };
        match diagnostic.severity {
            Severity::Note => info!(target: target, "Note: {}", diagnostic.message),
            Severity::Warning => warn!(target: target, "{}", diagnostic.message),
            Severity::Error => error!(target: target, "{}", diagnostic.message),
        }
    }
}

/// Keeps every diagnostic in memory. Used by tests and by callers that
/// want to surface diagnostics alongside a result.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(mut entries) => std::mem::take(&mut *entries),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.snapshot()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order_and_severity() {
        let sink = RecordingSink::new();
        sink.note("normalize", "first".to_string());
        sink.warning("filter", "second".to_string());
        sink.error("logs", "third".to_string());

        assert_eq!(sink.count(Severity::Warning), 1);
        let entries = sink.take();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].severity, Severity::Note);
        assert_eq!(entries[1].context, "filter");
        assert_eq!(entries[2].message, "third");
        assert!(sink.take().is_empty());
    }
}
