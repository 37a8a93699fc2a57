//! Resource checking pipeline.
//!
//! For every resource of a package the pipeline decides which checks apply
//! from the declared media type and the package's [`EpubVersion`], runs
//! them, and reports through a shared [`epubcheck_report::Report`]:
//!
//! - [`gate`] — existence and decryptability, always checked first
//! - [`registry`] — (media type, version) → grammar + assertion validators
//! - [`ops`] — markup documents: parser, semantic handler, validators
//! - [`bitmap`] — images: magic header, dimensions and size heuristics
//! - [`checker`] — the closed family of checkers behind [`ContentChecker`]
//! - [`batch`] — runs a whole manifest, sequentially or in parallel
//!
//! Validators and decoders are process-wide and stateless. Anything opened
//! for a resource (entry streams, temporary files) lives only for the
//! duration of that resource's check.

pub mod batch;
pub mod bitmap;
pub mod checker;
pub mod gate;
pub mod ops;
pub mod registry;
pub mod schema;
pub mod xml;

mod resource;

pub use batch::{BatchChecker, BatchSummary, ResourceOutcome};
pub use bitmap::{BitmapChecker, ImageHeuristics, UnknownFormat};
pub use checker::{ContentChecker, ResourceChecker};
pub use gate::{GateOutcome, check_resource};
pub use ops::OpsChecker;
pub use registry::{RegistryError, ValidatorKey, ValidatorPair, ValidatorRegistry};
pub use resource::Resource;
pub use schema::SchemaValidator;

pub use epubcheck_types::EpubVersion;
