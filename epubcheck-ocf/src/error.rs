//! Error types for the OCF crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("missing required entry: {0}")]
    MissingEntry(String),

    #[error("container document error: {0}")]
    Container(String),

    #[error("package document error: {0}")]
    PackageDocument(String),

    #[error(transparent)]
    Version(#[from] epubcheck_types::Error),
}
