//! Front end for the `epubcheck` binary: opens a publication, runs every
//! resource check and renders the collected messages.

pub mod config;

pub use config::{CheckConfig, ConfigError, ReportConfig, ReportFormat};

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use epubcheck_core::{BatchChecker, BatchSummary};
use epubcheck_ocf::{OcfDirectoryPackage, OcfError, OcfPackage, OcfZipPackage};
use epubcheck_report::{CollectingReport, Report, XmlReport};
use epubcheck_types::{Message, MessageId, MessageLocation};
use serde::Serialize;
use tracing::info;

/// Opens a zip container, or an exploded one when `path` is a directory.
pub fn open_package(path: &Path) -> Result<Box<dyn OcfPackage>> {
    let package: Box<dyn OcfPackage> = if path.is_dir() {
        Box::new(
            OcfDirectoryPackage::open(path)
                .with_context(|| format!("failed to open directory {}", path.display()))?,
        )
    } else {
        Box::new(
            OcfZipPackage::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        )
    };
    Ok(package)
}

/// Everything a finished run produced.
pub struct CheckOutcome {
    pub package_name: String,
    pub summary: BatchSummary,
    pub report: CollectingReport,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    package: &'a str,
    fatal: usize,
    errors: usize,
    warnings: usize,
    messages: Vec<Message>,
}

impl CheckOutcome {
    /// No fatal errors or errors, and no warnings either when
    /// `fail_on_warnings` is set.
    pub fn is_valid(&self, fail_on_warnings: bool) -> bool {
        self.report.fatal_error_count() == 0
            && self.report.error_count() == 0
            && (!fail_on_warnings || self.report.warning_count() == 0)
    }

    pub fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        for message in self.report.messages() {
            writeln!(out, "{message}")?;
        }
        let (fatal, errors, warnings) = (
            self.report.fatal_error_count(),
            self.report.error_count(),
            self.report.warning_count(),
        );
        if fatal + errors + warnings == 0 {
            writeln!(out, "No errors or warnings detected.")
        } else {
            writeln!(
                out,
                "Messages: {fatal} fatal / {errors} errors / {warnings} warnings"
            )?;
            writeln!(
                out,
                "Check finished with {} ({} of {} resources failed)",
                if fatal + errors > 0 { "errors" } else { "warnings" },
                self.summary.failed(),
                self.summary.results.len()
            )
        }
    }

    pub fn write_json(&self, out: &mut dyn Write) -> Result<()> {
        let output = JsonOutput {
            package: &self.package_name,
            fatal: self.report.fatal_error_count(),
            errors: self.report.error_count(),
            warnings: self.report.warning_count(),
            messages: self.report.messages(),
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
        Ok(())
    }

    /// Replays the run into a JHOVE-style XML report.
    pub fn to_xml_report(&self) -> XmlReport {
        let xml = XmlReport::new(self.package_name.as_str());
        for (path, feature, value) in self.report.infos() {
            xml.info(path.as_deref(), feature, &value);
        }
        for message in self.report.messages() {
            let args: Vec<&str> = message.args.iter().map(String::as_str).collect();
            xml.message(message.id, message.location.clone(), &args);
        }
        xml
    }

    pub fn write(&self, format: ReportFormat, out: &mut dyn Write) -> Result<()> {
        match format {
            ReportFormat::Text => self.write_text(out)?,
            ReportFormat::Json => self.write_json(out)?,
            ReportFormat::Xml => {
                let mut out = out;
                self.to_xml_report().generate(&mut out)?;
            }
        }
        Ok(())
    }
}

/// Checks the publication at `path`.
///
/// Problems with the publication are messages in the outcome. An error is
/// returned only when the container itself cannot be opened or its package
/// document cannot be parsed.
pub fn check_publication(path: &Path, config: &CheckConfig) -> Result<CheckOutcome> {
    let package = open_package(path)?;
    let report = CollectingReport::new();

    let summary = match BatchChecker::from_package(package.as_ref(), &report) {
        Ok(batch) => {
            let batch = match config.version {
                Some(version) => batch.with_version(version),
                None => batch,
            };
            info!(
                package = %package.name(),
                version = %batch.version(),
                resources = batch.resources().len(),
                parallel = config.parallel,
                "checking publication"
            );
            if config.parallel {
                batch.run_parallel()
            } else {
                batch.run()
            }
        }
        Err(OcfError::MissingEntry(entry)) => {
            report.message(
                MessageId::Rsc001,
                MessageLocation::new(package.name(), -1, -1),
                &[&entry],
            );
            BatchSummary::default()
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read the package document of {}", path.display()));
        }
    };

    Ok(CheckOutcome {
        package_name: package.name().to_string(),
        summary,
        report,
    })
}
