//! EPUB format generations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The format generation of a package.
///
/// Only the major generation matters for dispatch: a `3.0` and a `3.3`
/// package validate against the same profiles. Serialized as the package
/// attribute form; deserialized from the same strings [`FromStr`] accepts,
/// or from a bare number (`3`, `3.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "VersionRepr", into = "String")]
pub enum EpubVersion {
    V2,
    V3,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Text(String),
    Major(i64),
    Dotted(f64),
}

impl TryFrom<VersionRepr> for EpubVersion {
    type Error = Error;

    fn try_from(repr: VersionRepr) -> Result<Self, Self::Error> {
        match repr {
            VersionRepr::Text(text) => text.parse(),
            VersionRepr::Major(major) => major.to_string().parse(),
            VersionRepr::Dotted(number) => number.to_string().parse(),
        }
    }
}

impl From<EpubVersion> for String {
    fn from(version: EpubVersion) -> Self {
        version.as_package_attr().to_string()
    }
}

impl EpubVersion {
    /// Returns the major version number.
    #[must_use]
    pub const fn major(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Returns the `version` attribute value used in package documents.
    #[must_use]
    pub const fn as_package_attr(self) -> &'static str {
        match self {
            Self::V2 => "2.0",
            Self::V3 => "3.0",
        }
    }
}

impl fmt::Display for EpubVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_package_attr())
    }
}

impl FromStr for EpubVersion {
    type Err = Error;

    /// Accepts `2`, `3` and any dotted minor version (`2.0.1`, `3.3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let major = trimmed.split('.').next().unwrap_or_default();
        match major {
            "2" => Ok(Self::V2),
            "3" => Ok(Self::V3),
            _ => Err(Error::UnsupportedVersion(trimmed.to_string())),
        }
    }
}
