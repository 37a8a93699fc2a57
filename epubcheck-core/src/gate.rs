//! The pre-check every resource checker runs first.

use epubcheck_ocf::OcfPackage;
use epubcheck_report::Report;
use epubcheck_types::{MessageId, MessageLocation};
use tracing::debug;

/// Result of the gate. Only [`GateOutcome::Ready`] lets a checker go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Not in the container. RSC-001 was reported.
    Missing,
    /// In the container but encrypted beyond reach. RSC-004 was reported.
    Undecryptable,
    Ready,
}

impl GateOutcome {
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

/// Checks that `path` exists and can be decrypted, reporting the first
/// problem found.
pub fn check_resource(package: &dyn OcfPackage, report: &dyn Report, path: &str) -> GateOutcome {
    if !package.has_entry(path) {
        debug!(path = %path, "resource missing from container");
        report.message(
            MessageId::Rsc001,
            MessageLocation::new(package.name(), -1, -1),
            &[path],
        );
        GateOutcome::Missing
    } else if !package.can_decrypt(path) {
        debug!(path = %path, "resource cannot be decrypted");
        report.message(
            MessageId::Rsc004,
            MessageLocation::new(package.name(), 0, 0),
            &[path],
        );
        GateOutcome::Undecryptable
    } else {
        GateOutcome::Ready
    }
}
