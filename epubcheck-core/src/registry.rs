//! Process-wide table of schema validators keyed by media type and version.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, LazyLock};

use epubcheck_types::EpubVersion;
use thiserror::Error;

use crate::schema::{
    Assertion, AssertionValidator, GrammarValidator, SchemaValidator, SVG_NS, XHTML_NS,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate validator entry for {media_type} (EPUB {version})")]
    DuplicateKey {
        media_type: String,
        version: EpubVersion,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatorKey {
    pub media_type: String,
    pub version: EpubVersion,
}

impl ValidatorKey {
    pub fn new(media_type: impl Into<String>, version: EpubVersion) -> Self {
        Self {
            media_type: media_type.into(),
            version,
        }
    }
}

/// Grammar-based primary validator and optional rule-based secondary.
/// Either may be absent.
#[derive(Debug, Clone, Default)]
pub struct ValidatorPair {
    pub primary: Option<Arc<dyn SchemaValidator>>,
    pub secondary: Option<Arc<dyn SchemaValidator>>,
}

impl ValidatorPair {
    pub fn new(
        primary: Option<Arc<dyn SchemaValidator>>,
        secondary: Option<Arc<dyn SchemaValidator>>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Primary first, then secondary.
    pub fn validators(&self) -> impl Iterator<Item = &dyn SchemaValidator> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .map(|v| v.as_ref())
    }
}

/// Immutable after construction; safe to read from any thread.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    entries: HashMap<ValidatorKey, ValidatorPair>,
}

static XHTML_20: LazyLock<Arc<dyn SchemaValidator>> = LazyLock::new(|| {
    Arc::new(GrammarValidator::new(
        "schema/20/rng/ops20.nvdl",
        XHTML_NS,
        "html",
        &["head", "body"],
    ))
});

static XHTML_30: LazyLock<Arc<dyn SchemaValidator>> = LazyLock::new(|| {
    Arc::new(GrammarValidator::new(
        "schema/30/epub-xhtml-30.rnc",
        XHTML_NS,
        "html",
        &["head", "body"],
    ))
});

static SVG_11: LazyLock<Arc<dyn SchemaValidator>> = LazyLock::new(|| {
    Arc::new(GrammarValidator::new(
        "schema/20/rng/svg11.rng",
        SVG_NS,
        "svg",
        &[],
    ))
});

static SVG_30: LazyLock<Arc<dyn SchemaValidator>> = LazyLock::new(|| {
    Arc::new(GrammarValidator::new(
        "schema/30/epub-svg-30.rnc",
        SVG_NS,
        "svg",
        &[],
    ))
});

static ID_UNIQUE: LazyLock<Arc<dyn SchemaValidator>> = LazyLock::new(|| {
    Arc::new(AssertionValidator::new(
        "schema/20/sch/id-unique.sch",
        &[Assertion::UniqueIds],
    ))
});

static XHTML_30_SCH: LazyLock<Arc<dyn SchemaValidator>> = LazyLock::new(|| {
    Arc::new(AssertionValidator::new(
        "schema/30/epub-xhtml-30.sch",
        &[
            Assertion::UniqueIds,
            Assertion::NoNesting {
                namespace: XHTML_NS,
                local_name: "a",
            },
        ],
    ))
});

static SVG_30_SCH: LazyLock<Arc<dyn SchemaValidator>> = LazyLock::new(|| {
    Arc::new(AssertionValidator::new(
        "schema/30/epub-svg-30.sch",
        &[Assertion::UniqueIds],
    ))
});

static STANDARD: LazyLock<ValidatorRegistry> = LazyLock::new(ValidatorRegistry::standard);

impl ValidatorRegistry {
    /// The registry every checker uses unless given another one.
    pub fn global() -> &'static ValidatorRegistry {
        &STANDARD
    }

    /// The built-in table: XHTML and SVG for EPUB 2 and 3.
    pub fn standard() -> Self {
        fn pair(primary: &Arc<dyn SchemaValidator>, secondary: &Arc<dyn SchemaValidator>) -> ValidatorPair {
            ValidatorPair::new(Some(Arc::clone(primary)), Some(Arc::clone(secondary)))
        }

        let mut entries = HashMap::new();
        entries.insert(
            ValidatorKey::new("application/xhtml+xml", EpubVersion::V2),
            pair(&XHTML_20, &ID_UNIQUE),
        );
        entries.insert(
            ValidatorKey::new("application/xhtml+xml", EpubVersion::V3),
            pair(&XHTML_30, &XHTML_30_SCH),
        );
        entries.insert(
            ValidatorKey::new("image/svg+xml", EpubVersion::V2),
            pair(&SVG_11, &ID_UNIQUE),
        );
        entries.insert(
            ValidatorKey::new("image/svg+xml", EpubVersion::V3),
            pair(&SVG_30, &SVG_30_SCH),
        );
        Self { entries }
    }

    /// Builds a registry from explicit entries. Each key may appear once.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (ValidatorKey, ValidatorPair)>,
    ) -> Result<Self, RegistryError> {
        let mut map = HashMap::new();
        for (key, pair) in entries {
            match map.entry(key) {
                Entry::Occupied(e) => {
                    let key: &ValidatorKey = e.key();
                    return Err(RegistryError::DuplicateKey {
                        media_type: key.media_type.clone(),
                        version: key.version,
                    });
                }
                Entry::Vacant(e) => {
                    e.insert(pair);
                }
            }
        }
        Ok(Self { entries: map })
    }

    /// Looks up the validators for a media type. `None` means no schema
    /// validation applies; semantic checks still run.
    pub fn resolve(&self, media_type: &str, version: EpubVersion) -> Option<&ValidatorPair> {
        self.entries.get(&ValidatorKey::new(media_type, version))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
