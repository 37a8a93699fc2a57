use epubcheck_ocf::ManifestItem;

/// A package resource as seen by the checkers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Container path, e.g. `OEBPS/images/cover.png`.
    pub path: String,
    /// Media type declared in the package document.
    pub media_type: String,
    /// Declared manifest properties, space separated.
    pub properties: Option<String>,
}

impl Resource {
    pub fn new(path: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            media_type: media_type.into(),
            properties: None,
        }
    }

    #[must_use]
    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|p| p.split_whitespace().any(|t| t == property))
    }
}

impl From<&ManifestItem> for Resource {
    fn from(item: &ManifestItem) -> Self {
        Self {
            path: item.path.clone(),
            media_type: item.media_type.clone(),
            properties: item.properties.clone(),
        }
    }
}
