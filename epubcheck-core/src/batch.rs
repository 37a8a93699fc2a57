//! Checking every resource of a package.

use epubcheck_ocf::{ENCRYPTION_ENTRY, EPUB_MIMETYPE, OcfError, OcfPackage};
use epubcheck_report::{Feature, Report, ScopedReport};
use epubcheck_types::EpubVersion;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::checker::{ContentChecker, ResourceChecker};
use crate::registry::ValidatorRegistry;
use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOutcome {
    /// Checked and nothing was reported against it.
    Passed,
    /// Checked and at least one warning, error or fatal error was reported.
    Failed,
    /// No content checker applies to its media type.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceResult {
    pub path: String,
    pub media_type: String,
    pub outcome: ResourceOutcome,
}

/// Per-resource outcomes, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub results: Vec<ResourceResult>,
}

impl BatchSummary {
    fn count(&self, outcome: ResourceOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn passed(&self) -> usize {
        self.count(ResourceOutcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(ResourceOutcome::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(ResourceOutcome::Skipped)
    }

    pub fn outcome_of(&self, path: &str) -> Option<ResourceOutcome> {
        self.results
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.outcome)
    }
}

/// Runs the content checkers over a list of resources.
///
/// Each resource is checked through its own [`ScopedReport`], so outcomes
/// are exact whether resources run one after another or in parallel.
pub struct BatchChecker<'a> {
    package: &'a dyn OcfPackage,
    report: &'a dyn Report,
    registry: &'a ValidatorRegistry,
    version: EpubVersion,
    resources: Vec<Resource>,
}

impl<'a> BatchChecker<'a> {
    pub fn new(
        package: &'a dyn OcfPackage,
        report: &'a dyn Report,
        version: EpubVersion,
        resources: Vec<Resource>,
    ) -> Self {
        Self {
            package,
            report,
            registry: ValidatorRegistry::global(),
            version,
            resources,
        }
    }

    /// Reads the package document, reports its publication facts and
    /// prepares a batch over its manifest.
    #[instrument(skip_all, fields(package = %package.name()))]
    pub fn from_package(
        package: &'a dyn OcfPackage,
        report: &'a dyn Report,
    ) -> Result<Self, OcfError> {
        let document = package.package_document()?;
        info!(
            path = %document.path,
            version = %document.version,
            items = document.items.len(),
            "package document loaded"
        );

        report.info(None, Feature::FormatName, EPUB_MIMETYPE);
        report.info(None, Feature::FormatVersion, document.version.as_package_attr());
        let metadata = &document.metadata;
        for title in &metadata.titles {
            report.info(None, Feature::DcTitle, title);
        }
        if let Some(language) = &metadata.language {
            report.info(None, Feature::DcLanguage, language);
        }
        if let Some(identifier) = &metadata.identifier {
            report.info(None, Feature::UniqueIdent, identifier);
        }
        if let Some(modified) = &metadata.modified {
            report.info(None, Feature::ModifiedDate, modified);
        }
        if metadata.fixed_layout {
            report.info(None, Feature::HasFixedLayout, "true");
        }
        if package.has_entry(ENCRYPTION_ENTRY) {
            report.info(None, Feature::HasEncryption, "true");
        }
        for item in &document.items {
            report.info(Some(item.path.as_str()), Feature::DeclaredMimetype, &item.media_type);
        }

        let resources = document.items.iter().map(Resource::from).collect();
        Ok(Self::new(package, report, document.version, resources))
    }

    #[must_use]
    pub fn with_registry(mut self, registry: &'a ValidatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Checks as `version` instead of the declared one.
    #[must_use]
    pub fn with_version(mut self, version: EpubVersion) -> Self {
        self.version = version;
        self
    }

    pub fn version(&self) -> EpubVersion {
        self.version
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Checks resources one at a time, in manifest order.
    pub fn run(&self) -> BatchSummary {
        BatchSummary {
            results: self.resources.iter().map(|r| self.check_one(r)).collect(),
        }
    }

    /// Checks resources on the rayon thread pool. Messages reach the report
    /// in no particular order across resources; the summary keeps manifest
    /// order.
    pub fn run_parallel(&self) -> BatchSummary {
        BatchSummary {
            results: self
                .resources
                .par_iter()
                .map(|r| self.check_one(r))
                .collect(),
        }
    }

    fn check_one(&self, resource: &Resource) -> ResourceResult {
        let scope = ScopedReport::new(self.report);
        let checker = ResourceChecker::for_resource(
            self.package,
            &scope,
            self.registry,
            resource,
            self.version,
        );
        let outcome = match checker {
            Some(checker) => {
                checker.run_checks();
                if scope.is_clean() {
                    ResourceOutcome::Passed
                } else {
                    ResourceOutcome::Failed
                }
            }
            None => ResourceOutcome::Skipped,
        };
        debug!(path = %resource.path, media_type = %resource.media_type, ?outcome, "resource checked");
        ResourceResult {
            path: resource.path.clone(),
            media_type: resource.media_type.clone(),
            outcome,
        }
    }
}
