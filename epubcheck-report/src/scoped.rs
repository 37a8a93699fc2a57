//! Per-resource counting on top of a shared report.

use epubcheck_types::{MessageId, MessageLocation};

use crate::{Counters, Feature, Report};

/// Forwards every message to `parent` and also counts it locally.
///
/// The counters of a `ScopedReport` only ever reflect messages sent through
/// it, so a before/after snapshot taken on it is exact even while other
/// resources are being checked against the same parent on other threads.
pub struct ScopedReport<'a> {
    parent: &'a dyn Report,
    counters: Counters,
}

impl<'a> ScopedReport<'a> {
    pub fn new(parent: &'a dyn Report) -> Self {
        Self {
            parent,
            counters: Counters::new(),
        }
    }

    /// True when nothing counted against this scope so far.
    pub fn is_clean(&self) -> bool {
        self.counters.snapshot() == Default::default()
    }
}

impl Report for ScopedReport<'_> {
    fn message(&self, id: MessageId, location: MessageLocation, args: &[&str]) {
        self.counters.record(id.severity());
        self.parent.message(id, location, args);
    }

    fn info(&self, path: Option<&str>, feature: Feature, value: &str) {
        self.parent.info(path, feature, value);
    }

    fn fatal_error_count(&self) -> usize {
        self.counters.fatal()
    }

    fn error_count(&self) -> usize {
        self.counters.errors()
    }

    fn warning_count(&self) -> usize {
        self.counters.warnings()
    }
}
