//! EPUB checker
//!
//! Checks a publication (an `.epub` file or an unpacked directory) and
//! reports every problem found in its content documents and images.
//!
//! Usage:
//!   epubcheck book.epub
//!   epubcheck book.epub --xml report.xml
//!   epubcheck unpacked/ --parallel --json
//!
//! Exits with 0 when the publication is valid, 1 otherwise.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use epubcheck_cli::{CheckConfig, ReportFormat, check_publication};
use epubcheck_types::EpubVersion;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "epubcheck")]
#[command(about = "Validates EPUB publications")]
struct Args {
    /// EPUB file or unpacked publication directory
    path: PathBuf,

    /// Configuration file (defaults to ./epubcheck.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Check as this EPUB version (2 or 3) instead of the declared one
    #[arg(long)]
    version: Option<EpubVersion>,

    /// Write a JHOVE XML report to this file
    #[arg(long, value_name = "OUT")]
    xml: Option<PathBuf>,

    /// Print messages as JSON
    #[arg(long, conflicts_with = "xml")]
    json: bool,

    /// Check resources in parallel
    #[arg(short, long)]
    parallel: bool,

    /// Treat warnings as failures
    #[arg(long)]
    fail_on_warnings: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Command-line flags win over the config file.
    fn apply_to(&self, config: &mut CheckConfig) {
        if let Some(version) = self.version {
            config.version = Some(version);
        }
        if let Some(xml) = &self.xml {
            config.report.format = ReportFormat::Xml;
            config.report.output = Some(xml.clone());
        }
        if self.json {
            config.report.format = ReportFormat::Json;
        }
        config.parallel |= self.parallel;
        config.fail_on_warnings |= self.fail_on_warnings;
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "warn" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            eprintln!("epubcheck: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let mut config = CheckConfig::load(args.config.as_deref());
    args.apply_to(&mut config);
    debug!(?config, "effective configuration");

    let outcome = check_publication(&args.path, &config)?;

    let mut out: Box<dyn Write> = match &config.report.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    outcome.write(config.report.format, out.as_mut())?;
    out.flush()?;

    Ok(outcome.is_valid(config.fail_on_warnings))
}
