//! Diagnostic side channel.
//!
//! Nothing in the logger returns an error to its caller; misuse, I/O failures
//! and shape warnings all end up here instead.

use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

pub trait Reporter {
    fn report(&self, severity: Severity, message: &str);

    fn debug(&self, message: &str) {
        self.report(Severity::Debug, message);
    }

    fn warning(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    fn critical(&self, message: &str) {
        self.report(Severity::Critical, message);
    }
}

/// Forwards diagnostics to whatever `tracing` subscriber the host installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => debug!(target: "rowlog", "{}", message),
            Severity::Warning => warn!(target: "rowlog", "{}", message),
            Severity::Critical => error!(target: "rowlog", "{}", message),
        }
    }
}

/// Keeps every diagnostic in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, severity: Severity, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Diagnostic {
                severity,
                message: message.to_string(),
            });
        }
    }
}
