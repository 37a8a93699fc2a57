//! Core value types for the EPUB checker.
//!
//! This crate defines the small, dependency-free vocabulary shared by the
//! package, report and checking crates:
//! - [`EpubVersion`] — the format generation a package declares (2 or 3)
//! - [`MessageId`] and [`Severity`] — the message catalog
//! - [`MessageLocation`] and [`Message`] — what a report sink receives
//!
//! Nothing here performs I/O.

mod location;
mod message;
mod version;

pub use location::MessageLocation;
pub use message::{Message, MessageId, Severity};
pub use version::EpubVersion;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing type values from text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported EPUB version: {0}")]
    UnsupportedVersion(String),
}
