//! Markup validation for XHTML and SVG content documents.

mod handler;

pub use handler::{OpsHandler, OpsHandler30};

use std::io;

use epubcheck_ocf::OcfPackage;
use epubcheck_report::Report;
use epubcheck_types::{EpubVersion, MessageId, MessageLocation};
use tracing::{debug, warn};

use crate::checker::ContentChecker;
use crate::gate;
use crate::registry::{ValidatorPair, ValidatorRegistry};
use crate::resource::Resource;
use crate::xml::{XmlHandler, XmlParser};

/// Checks one markup resource: schema validation plus the version's
/// semantic handler, all in a single parse.
pub struct OpsChecker<'a> {
    package: &'a dyn OcfPackage,
    report: &'a dyn Report,
    registry: &'a ValidatorRegistry,
    resource: Resource,
    version: EpubVersion,
}

impl<'a> OpsChecker<'a> {
    pub fn new(
        package: &'a dyn OcfPackage,
        report: &'a dyn Report,
        resource: Resource,
        version: EpubVersion,
    ) -> Self {
        Self {
            package,
            report,
            registry: ValidatorRegistry::global(),
            resource,
            version,
        }
    }

    /// Uses `registry` instead of the global one.
    #[must_use]
    pub fn with_registry(mut self, registry: &'a ValidatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Validates the document without the existence gate.
    ///
    /// Returns true when no fatal error, error or warning was reported
    /// during this call. Counters are read on the report this checker was
    /// built with, so give each concurrently checked resource its own
    /// [`epubcheck_report::ScopedReport`].
    pub fn validate(&self) -> bool {
        let before = self.report.snapshot();
        let pair = self
            .registry
            .resolve(&self.resource.media_type, self.version);
        if pair.is_none() {
            debug!(
                path = %self.resource.path,
                media_type = %self.resource.media_type,
                version = %self.version,
                "no schema registered; running semantic checks only"
            );
        }

        if let Err(e) = self.validate_against_schemas(pair) {
            warn!(path = %self.resource.path, error = %e, "failed to read content document");
            self.report.message(
                MessageId::Pkg008,
                MessageLocation::new(&self.resource.path, 0, 0),
                &[&self.resource.path],
            );
        }

        self.report.snapshot().unchanged_since(&before)
    }

    fn validate_against_schemas(&self, pair: Option<&ValidatorPair>) -> io::Result<()> {
        let path = self.resource.path.as_str();
        let stream = self.package.input_stream(path)?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no entry for {path}"))
        })?;

        let mut parser = XmlParser::new(
            stream,
            path,
            &self.resource.media_type,
            self.version,
            self.report,
        );
        for validator in pair.into_iter().flat_map(ValidatorPair::validators) {
            parser.add_validator(validator);
        }
        parser.add_handler(self.semantic_handler());
        parser.process()
    }

    fn semantic_handler(&self) -> Box<dyn XmlHandler + 'a> {
        match self.version {
            EpubVersion::V2 => Box::new(OpsHandler::new()),
            EpubVersion::V3 => Box::new(OpsHandler30::new(self.resource.properties.clone())),
        }
    }
}

impl ContentChecker for OpsChecker<'_> {
    fn run_checks(&self) {
        if gate::check_resource(self.package, self.report, &self.resource.path).is_ready() {
            self.validate();
        }
    }
}
