//! Checks for raster (and vector) image resources.
//!
//! An image passes through three stages:
//! 1. the existence gate
//! 2. a 4-byte magic header check against the declared media type
//! 3. dimension and payload heuristics against fixed thresholds
//!
//! Images are measured from a file: entries of a zip container are copied
//! to a temporary file that is removed as soon as the check is done.

mod decoder;
mod header;
mod heuristics;

pub use decoder::{DecodeError, ImageDecoder, ImageMetadata, StreamMetadata, decoder_for_suffix};
pub use header::{HEADER_LEN, header_matches, read_header};
pub use heuristics::{ImageHeuristics, UnknownFormat, suffix_of};

use epubcheck_ocf::OcfPackage;
use epubcheck_report::Report;
use epubcheck_types::{MessageId, MessageLocation};
use tracing::debug;

use crate::checker::ContentChecker;
use crate::gate;

/// Images at least this tall are reported as oversized.
pub const HEIGHT_MAX: u32 = 2 * 1080;
/// Images at least this wide are reported as oversized.
pub const WIDTH_MAX: u32 = 2 * 1920;
/// Payloads of at least this many bytes are reported as oversized.
pub const IMAGESIZE_MAX: u64 = 4 * 1024 * 1024;

pub struct BitmapChecker<'a> {
    package: &'a dyn OcfPackage,
    report: &'a dyn Report,
    path: String,
    media_type: String,
}

impl<'a> BitmapChecker<'a> {
    pub fn new(
        package: &'a dyn OcfPackage,
        report: &'a dyn Report,
        path: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            package,
            report,
            path: path.into(),
            media_type: media_type.into(),
        }
    }

    /// Measures an image in this checker's package.
    ///
    /// `Ok(None)` means the image could not be read and PKG-021 was
    /// reported. SVG images are not decoded; they measure 0×0 with their
    /// byte length.
    pub fn image_sizes(&self, path: &str) -> Result<Option<ImageHeuristics>, UnknownFormat> {
        heuristics::image_sizes(self.package, self.report, path)
    }

    fn check_header(&self, header: &[u8; HEADER_LEN]) {
        if !header_matches(&self.media_type, header) {
            debug!(path = %self.path, media_type = %self.media_type, "image header mismatch");
            self.report.message(
                MessageId::Opf029,
                MessageLocation::new(self.package.name(), 0, 0),
                &[&self.path, &self.media_type],
            );
        }
    }

    fn check_image_dimensions(&self) {
        let path = self.path.as_str();
        let location = || MessageLocation::new(path, -1, -1).with_context(path);
        match self.image_sizes(path) {
            Ok(Some(h)) => {
                if h.height >= HEIGHT_MAX || h.width >= WIDTH_MAX {
                    self.report.message(MessageId::Opf051, location(), &[]);
                }
                if h.length >= IMAGESIZE_MAX {
                    self.report.message(MessageId::Opf057, location(), &[]);
                }
            }
            Ok(None) => {}
            Err(unknown) => {
                debug!(path = %path, reason = %unknown, "image format not measurable");
                self.report.message(MessageId::Pkg021, location(), &[]);
            }
        }
    }
}

impl ContentChecker for BitmapChecker<'_> {
    fn run_checks(&self) {
        let path = self.path.as_str();
        if !gate::check_resource(self.package, self.report, path).is_ready() {
            return;
        }

        let header = match self.package.input_stream(path) {
            Ok(Some(mut stream)) => read_header(&mut stream),
            Ok(None) => {
                self.report.message(
                    MessageId::Rsc001,
                    MessageLocation::new(self.package.name(), 0, 0),
                    &[path],
                );
                return;
            }
            Err(e) => Err(e),
        };

        match header {
            Ok((_, read)) if read < HEADER_LEN => {
                self.report
                    .message(MessageId::Med004, MessageLocation::new(path, 0, 0), &[]);
            }
            Ok((header, _)) => self.check_header(&header),
            Err(e) => {
                debug!(path = %path, error = %e, "failed to read image header");
                self.report.message(
                    MessageId::Pkg021,
                    MessageLocation::new(path, 0, 0).with_context(path),
                    &[],
                );
                return;
            }
        }

        self.check_image_dimensions();
    }
}
