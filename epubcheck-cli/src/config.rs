//! `epubcheck.toml` loading.

use std::path::{Path, PathBuf};

use epubcheck_types::EpubVersion;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "epubcheck.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Xml,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// Where to write the report. Standard output when unset.
    pub output: Option<PathBuf>,
}

/// Settings for one check run. Command-line flags override these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Check as this version instead of the one the package declares.
    pub version: Option<EpubVersion>,
    pub parallel: bool,
    pub fail_on_warnings: bool,
    pub report: ReportConfig,
}

impl CheckConfig {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads `path`, or `epubcheck.toml` in the working directory when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Self {
        Self::load_from(path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE)))
    }

    /// Loads a config file. Falls back to defaults with a warning when the
    /// file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        let loaded = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|contents| Self::parse(&contents));
        match loaded {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load config {:?}: {}. Falling back to defaults.", path, e);
                Self::default()
            }
        }
    }
}
