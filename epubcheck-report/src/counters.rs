//! Atomic message counters.

use std::sync::atomic::{AtomicUsize, Ordering};

use epubcheck_types::Severity;

/// Fatal/error/warning/hint totals, safe to bump from several threads.
#[derive(Debug, Default)]
pub struct Counters {
    fatal: AtomicUsize,
    errors: AtomicUsize,
    warnings: AtomicUsize,
    hints: AtomicUsize,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, severity: Severity) {
        let counter = match severity {
            Severity::Fatal => &self.fatal,
            Severity::Error => &self.errors,
            Severity::Warning => &self.warnings,
            Severity::Hint => &self.hints,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fatal(&self) -> usize {
        self.fatal.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn hints(&self) -> usize {
        self.hints.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            fatal: self.fatal(),
            errors: self.errors(),
            warnings: self.warnings(),
        }
    }
}

/// Counter values at one point in time. Only meaningful compared with
/// another snapshot taken from the same report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub fatal: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl CounterSnapshot {
    /// True when no fatal error, error or warning was added since `earlier`.
    #[must_use]
    pub fn unchanged_since(&self, earlier: &CounterSnapshot) -> bool {
        self == earlier
    }
}
