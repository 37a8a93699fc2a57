//! Where a message points to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position inside a package.
///
/// `line` and `column` are one-based; zero or negative values mean the
/// position is unknown. Reports render unknown positions by omitting them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageLocation {
    pub path: String,
    pub line: i64,
    pub column: i64,
    /// Optional excerpt or entry name giving more context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl MessageLocation {
    pub fn new(path: impl Into<String>, line: i64, column: i64) -> Self {
        Self {
            path: path.into(),
            line,
            column,
            context: None,
        }
    }

    /// A location whose line and column are unknown (`-1`).
    pub fn unknown(path: impl Into<String>) -> Self {
        Self::new(path, -1, -1)
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns true if the line number points at a real line.
    #[must_use]
    pub fn has_line(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for MessageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if self.has_line() {
            write!(f, "({}", self.line)?;
            if self.column > 0 {
                write!(f, ",{}", self.column)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}
