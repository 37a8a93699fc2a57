//! The message catalog and emitted messages.
//!
//! Every condition the checker can detect maps to exactly one [`MessageId`].
//! The id carries its default [`Severity`] and an English text template with
//! positional placeholders (`{0}`, `{1}`, ...) filled from the message
//! arguments.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::MessageLocation;

/// How serious a message is. Only fatal errors, errors and warnings count
/// towards a resource failing validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Hint,
}

impl Severity {
    /// Label used when rendering messages (`FATAL`, `ERROR`, `WARN`, `HINT`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARN",
            Self::Hint => "HINT",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Catalog identifiers for every message the checker emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageId {
    /// Declared resource is absent from the container.
    #[serde(rename = "RSC-001")]
    Rsc001,
    /// Resource is present but cannot be decrypted.
    #[serde(rename = "RSC-004")]
    Rsc004,
    /// Schema violation reported by a grammar or assertion validator.
    #[serde(rename = "RSC-005")]
    Rsc005,
    /// Markup is not well-formed.
    #[serde(rename = "RSC-016")]
    Rsc016,
    /// Resource stream could not be read for schema validation.
    #[serde(rename = "PKG-008")]
    Pkg008,
    /// Image could not be read.
    #[serde(rename = "PKG-021")]
    Pkg021,
    /// Image header is shorter than the magic number.
    #[serde(rename = "MED-004")]
    Med004,
    /// Declared property was not found in the content.
    #[serde(rename = "OPF-015")]
    Opf015,
    /// Content uses a feature whose property is not declared.
    #[serde(rename = "OPF-014")]
    Opf014,
    /// Image signature does not match the declared media type.
    #[serde(rename = "OPF-029")]
    Opf029,
    /// Image dimensions exceed the recommended maximum.
    #[serde(rename = "OPF-051")]
    Opf051,
    /// Image byte length exceeds the recommended maximum.
    #[serde(rename = "OPF-057")]
    Opf057,
    /// Link or embed attribute is empty.
    #[serde(rename = "HTM-008")]
    Htm008,
}

impl MessageId {
    /// Every catalog entry, in catalog order.
    pub const ALL: [MessageId; 13] = [
        Self::Rsc001,
        Self::Rsc004,
        Self::Rsc005,
        Self::Rsc016,
        Self::Pkg008,
        Self::Pkg021,
        Self::Med004,
        Self::Opf014,
        Self::Opf015,
        Self::Opf029,
        Self::Opf051,
        Self::Opf057,
        Self::Htm008,
    ];

    /// The stable code, e.g. `RSC-001`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Rsc001 => "RSC-001",
            Self::Rsc004 => "RSC-004",
            Self::Rsc005 => "RSC-005",
            Self::Rsc016 => "RSC-016",
            Self::Pkg008 => "PKG-008",
            Self::Pkg021 => "PKG-021",
            Self::Med004 => "MED-004",
            Self::Opf014 => "OPF-014",
            Self::Opf015 => "OPF-015",
            Self::Opf029 => "OPF-029",
            Self::Opf051 => "OPF-051",
            Self::Opf057 => "OPF-057",
            Self::Htm008 => "HTM-008",
        }
    }

    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Rsc016 => Severity::Fatal,
            Self::Rsc001
            | Self::Rsc004
            | Self::Rsc005
            | Self::Pkg008
            | Self::Pkg021
            | Self::Med004
            | Self::Opf014
            | Self::Opf015 => Severity::Error,
            Self::Opf029 | Self::Opf051 | Self::Opf057 | Self::Htm008 => Severity::Warning,
        }
    }

    /// English text template with `{n}` placeholders.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Rsc001 => "File '{0}' could not be found.",
            Self::Rsc004 => "File '{0}' could not be decrypted.",
            Self::Rsc005 => "Error while parsing file: {0}",
            Self::Rsc016 => "Fatal error while parsing file: {0}",
            Self::Pkg008 => "Unable to read file '{0}'.",
            Self::Pkg021 => "Corrupted image file encountered.",
            Self::Med004 => "Image file header may be corrupted.",
            Self::Opf014 => "The property '{0}' should be declared in the OPF file.",
            Self::Opf015 => "The property '{0}' should not be declared in the OPF file.",
            Self::Opf029 => {
                "The file '{0}' does not appear to match the media type {1}, as specified in the OPF file."
            }
            Self::Opf051 => "Image dimensions exceed recommended size.",
            Self::Opf057 => "Image file length exceeds recommended size.",
            Self::Htm008 => "The '{0}' attribute of element '{1}' must not be empty.",
        }
    }

    /// Fills the template with `args`. Placeholders without a matching
    /// argument are left as-is.
    pub fn format(self, args: &[String]) -> String {
        let template = self.template();
        let mut text = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            text.push_str(&rest[..open]);
            let tail = &rest[open..];
            let arg = tail
                .find('}')
                .and_then(|close| tail[1..close].parse::<usize>().ok().map(|i| (i, close)))
                .and_then(|(i, close)| args.get(i).map(|arg| (arg, close)));
            match arg {
                Some((arg, close)) => {
                    text.push_str(arg);
                    rest = &tail[close + 1..];
                }
                None => {
                    text.push('{');
                    rest = &tail[1..];
                }
            }
        }
        text.push_str(rest);
        text
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A message as delivered to a report sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub severity: Severity,
    pub location: MessageLocation,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Message {
    /// Creates a message with the catalog's default severity.
    pub fn new(id: MessageId, location: MessageLocation, args: Vec<String>) -> Self {
        Self {
            id,
            severity: id.severity(),
            location,
            args,
        }
    }

    /// The rendered message text.
    pub fn text(&self) -> String {
        self.id.format(&self.args)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}): {}: {}",
            self.severity,
            self.id,
            self.location,
            self.text()
        )
    }
}
