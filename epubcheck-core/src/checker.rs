use epubcheck_ocf::OcfPackage;
use epubcheck_report::Report;
use epubcheck_types::EpubVersion;

use crate::bitmap::BitmapChecker;
use crate::ops::OpsChecker;
use crate::registry::ValidatorRegistry;
use crate::resource::Resource;

/// Runs every check that applies to one resource.
pub trait ContentChecker {
    fn run_checks(&self);
}

/// Markup media types checked by [`OpsChecker`].
pub const MARKUP_MEDIA_TYPES: [&str; 2] = ["application/xhtml+xml", "image/svg+xml"];

/// Raster media types checked by [`BitmapChecker`].
pub const BITMAP_MEDIA_TYPES: [&str; 4] = ["image/gif", "image/jpeg", "image/png", "image/bmp"];

/// The checker chosen for a resource by its media type.
pub enum ResourceChecker<'a> {
    Ops(OpsChecker<'a>),
    Bitmap(BitmapChecker<'a>),
}

impl<'a> ResourceChecker<'a> {
    /// `None` when no content checker applies to the media type.
    pub fn for_resource(
        package: &'a dyn OcfPackage,
        report: &'a dyn Report,
        registry: &'a ValidatorRegistry,
        resource: &Resource,
        version: EpubVersion,
    ) -> Option<Self> {
        let media_type = resource.media_type.as_str();
        if MARKUP_MEDIA_TYPES.contains(&media_type) {
            Some(Self::Ops(
                OpsChecker::new(package, report, resource.clone(), version).with_registry(registry),
            ))
        } else if BITMAP_MEDIA_TYPES.contains(&media_type) {
            Some(Self::Bitmap(BitmapChecker::new(
                package,
                report,
                &resource.path,
                media_type,
            )))
        } else {
            None
        }
    }
}

impl ContentChecker for ResourceChecker<'_> {
    fn run_checks(&self) {
        match self {
            Self::Ops(checker) => checker.run_checks(),
            Self::Bitmap(checker) => checker.run_checks(),
        }
    }
}
