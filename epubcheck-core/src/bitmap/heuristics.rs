//! Dimension and payload measurement for image resources.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use epubcheck_ocf::OcfPackage;
use epubcheck_report::Report;
use epubcheck_types::{MessageId, MessageLocation};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use super::decoder::{DecodeError, ImageDecoder, decoder_for_suffix};

const TEMP_PREFIX: &str = "img";

/// Measured size of an image. Vector images have zero dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeuristics {
    pub width: u32,
    pub height: u32,
    /// Payload length in bytes.
    pub length: u64,
}

/// The resource cannot be measured because its kind is unknown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnknownFormat {
    #[error("no extension for file: {0}")]
    NoSuffix(String),

    #[error("not a known image file: {0}")]
    NoDecoder(String),
}

/// Suffix of the final path segment, without the dot.
pub fn suffix_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(_, suffix)| suffix)
}

/// Measures the image at `path`.
///
/// `Ok(None)` means the image could not be read or decoded; PKG-021 has
/// already been reported for it. Vector images (`.svg`) are never decoded
/// and report only their byte length.
pub fn image_sizes(
    package: &dyn OcfPackage,
    report: &dyn Report,
    path: &str,
) -> Result<Option<ImageHeuristics>, UnknownFormat> {
    let suffix = suffix_of(path).ok_or_else(|| UnknownFormat::NoSuffix(path.to_string()))?;

    if suffix.eq_ignore_ascii_case("svg") {
        return Ok(match materialize(package, path, suffix) {
            Ok(Some(file)) => match file.len() {
                Ok(length) => Some(ImageHeuristics {
                    width: 0,
                    height: 0,
                    length,
                }),
                Err(e) => {
                    unreadable(report, path, &e.into());
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                unreadable(report, path, &e.into());
                None
            }
        });
    }

    let decoder =
        decoder_for_suffix(suffix).ok_or_else(|| UnknownFormat::NoDecoder(path.to_string()))?;

    let measured = match materialize(package, path, suffix) {
        Ok(Some(file)) => measure(decoder, &file),
        Ok(None) => Err(io::Error::new(io::ErrorKind::NotFound, format!("no entry for {path}")).into()),
        Err(e) => Err(e.into()),
    };
    match measured {
        Ok(heuristics) => Ok(Some(heuristics)),
        Err(e) => {
            unreadable(report, path, &e);
            Ok(None)
        }
    }
}

fn measure(decoder: &dyn ImageDecoder, file: &Materialized) -> Result<ImageHeuristics, DecodeError> {
    let length = file.len()?;
    let mut reader = BufReader::new(file.open()?);
    let metadata = decoder.read_metadata(&mut reader)?;
    let (width, height) = metadata.effective_dimensions();
    debug!(
        format = decoder.format_name(),
        width, height, length, "measured image"
    );
    Ok(ImageHeuristics {
        width,
        height,
        length,
    })
}

fn unreadable(report: &dyn Report, path: &str, error: &DecodeError) {
    debug!(path = %path, error = %error, "image could not be read");
    report.message(
        MessageId::Pkg021,
        MessageLocation::new(path, -1, -1).with_context(path),
        &[],
    );
}

/// An image available as a file for the duration of one check.
#[derive(Debug)]
pub(crate) enum Materialized {
    /// Copied out of a zip container. Deleted on drop.
    Temp(NamedTempFile),
    /// Already a file in an exploded container. Never deleted.
    InPlace(PathBuf),
}

impl Materialized {
    pub(crate) fn path(&self) -> &Path {
        match self {
            Self::Temp(file) => file.path(),
            Self::InPlace(path) => path,
        }
    }

    fn len(&self) -> io::Result<u64> {
        Ok(fs::metadata(self.path())?.len())
    }

    fn open(&self) -> io::Result<File> {
        match self {
            Self::Temp(file) => file.reopen(),
            Self::InPlace(path) => File::open(path),
        }
    }
}

/// Makes `path` available as a file. Zip entries are copied to a fresh
/// temporary file named `img*.<suffix>`; concurrent calls never share one.
pub(crate) fn materialize(
    package: &dyn OcfPackage,
    path: &str,
    suffix: &str,
) -> io::Result<Option<Materialized>> {
    if let Some(file) = package.exploded_path(path) {
        return Ok(Some(Materialized::InPlace(file)));
    }
    let Some(mut stream) = package.input_stream(path)? else {
        return Ok(None);
    };
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(&format!(".{suffix}"))
        .tempfile()?;
    io::copy(&mut stream, &mut temp)?;
    temp.flush()?;
    Ok(Some(Materialized::Temp(temp)))
}
