//! Report sinks for the EPUB checker.
//!
//! A [`Report`] receives every message emitted while checking a package and
//! keeps running fatal/error/warning counters. Checkers compare a
//! [`CounterSnapshot`] taken before and after a unit of work to decide
//! whether that work raised new issues.
//!
//! Sinks provided here:
//! - [`CollectingReport`] — keeps messages in memory, in emission order
//! - [`ScopedReport`] — forwards to a parent sink but counts locally, so
//!   concurrent resource checks never see each other's increments
//! - [`XmlReport`] — renders a JHOVE-style XML document at the end of a run

mod collecting;
mod counters;
mod scoped;
mod xml;

pub use collecting::CollectingReport;
pub use counters::{CounterSnapshot, Counters};
pub use scoped::ScopedReport;
pub use xml::XmlReport;

use epubcheck_types::{MessageId, MessageLocation};
use serde::{Deserialize, Serialize};

/// Publication-level facts a checker may pass to a report besides messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    FormatName,
    FormatVersion,
    CreationDate,
    ModifiedDate,
    DeclaredMimetype,
    Reference,
    DcLanguage,
    DcTitle,
    UniqueIdent,
    HasEncryption,
    HasScripts,
    HasFixedLayout,
}

/// A sink for checker messages.
///
/// Implementations must be safe to share across threads: counters are
/// updated atomically and messages are appended in emission order.
pub trait Report: Send + Sync {
    /// Records one message. Severity comes from the catalog entry.
    fn message(&self, id: MessageId, location: MessageLocation, args: &[&str]);

    /// Records a publication-level fact. Sinks that do not render
    /// publication properties ignore it.
    fn info(&self, path: Option<&str>, feature: Feature, value: &str) {
        let _ = (path, feature, value);
    }

    fn fatal_error_count(&self) -> usize;

    fn error_count(&self) -> usize;

    fn warning_count(&self) -> usize;

    /// Reads the three failure counters at once.
    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            fatal: self.fatal_error_count(),
            errors: self.error_count(),
            warnings: self.warning_count(),
        }
    }
}

/// Converts borrowed message arguments into the owned form stored in a
/// [`epubcheck_types::Message`].
pub(crate) fn owned_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| (*a).to_string()).collect()
}
