//! The package document (OPF): version, metadata and manifest.

use epubcheck_types::EpubVersion;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::OcfError;
use crate::paths::{attr, resolve};

/// One manifest `<item>`, with `href` resolved to a container path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub path: String,
    pub media_type: String,
    /// Space-separated `properties` tokens (EPUB 3 only).
    pub properties: Option<String>,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|p| p.split_whitespace().any(|t| t == property))
    }
}

/// Dublin Core metadata relevant to reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub titles: Vec<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
    pub modified: Option<String>,
    pub fixed_layout: bool,
}

#[derive(Debug, Clone)]
pub struct PackageDocument {
    /// Container path of the package document itself.
    pub path: String,
    pub version: EpubVersion,
    pub metadata: PackageMetadata,
    pub items: Vec<ManifestItem>,
}

#[derive(Clone, Copy, PartialEq)]
enum Capture {
    None,
    Title,
    Language,
    Identifier,
    Modified,
    Layout,
}

impl PackageDocument {
    pub fn parse(path: &str, bytes: &[u8]) -> Result<Self, OcfError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        let mut version = None;
        let mut unique_identifier = None;
        let mut metadata = PackageMetadata::default();
        let mut identifiers: Vec<(Option<String>, String)> = Vec::new();
        let mut items = Vec::new();
        let mut capture = Capture::None;
        let mut capture_id: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => {
                    capture = Capture::None;
                    match e.local_name().as_ref() {
                        b"package" => {
                            let declared = attr(&e, "version").ok_or_else(|| {
                                OcfError::PackageDocument("package has no version".into())
                            })?;
                            version = Some(declared.parse::<EpubVersion>()?);
                            unique_identifier = attr(&e, "unique-identifier");
                        }
                        b"title" => capture = Capture::Title,
                        b"language" => capture = Capture::Language,
                        b"identifier" => {
                            capture = Capture::Identifier;
                            capture_id = attr(&e, "id");
                        }
                        b"meta" => {
                            capture = match attr(&e, "property").as_deref() {
                                Some("dcterms:modified") => Capture::Modified,
                                Some("rendition:layout") => Capture::Layout,
                                _ => Capture::None,
                            }
                        }
                        b"item" => items.push(manifest_item(path, &e)?),
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?.trim().to_string();
                    match capture {
                        Capture::Title => metadata.titles.push(text),
                        Capture::Language => metadata.language = Some(text),
                        Capture::Identifier => identifiers.push((capture_id.take(), text)),
                        Capture::Modified => metadata.modified = Some(text),
                        Capture::Layout => metadata.fixed_layout = text == "pre-paginated",
                        Capture::None => {}
                    }
                    capture = Capture::None;
                }
                Event::End(_) => capture = Capture::None,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let version = version
            .ok_or_else(|| OcfError::PackageDocument("no package element".into()))?;
        metadata.identifier = identifiers
            .iter()
            .find(|(id, _)| id.is_some() && id.as_deref() == unique_identifier.as_deref())
            .or_else(|| identifiers.first())
            .map(|(_, value)| value.clone());

        Ok(Self {
            path: path.to_string(),
            version,
            metadata,
            items,
        })
    }

    pub fn item_by_path(&self, path: &str) -> Option<&ManifestItem> {
        self.items.iter().find(|i| i.path == path)
    }
}

fn manifest_item(
    opf_path: &str,
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<ManifestItem, OcfError> {
    let id = attr(e, "id").unwrap_or_default();
    let href = attr(e, "href")
        .ok_or_else(|| OcfError::PackageDocument(format!("item '{id}' has no href")))?;
    let path = resolve(opf_path, &href).ok_or_else(|| {
        OcfError::PackageDocument(format!("item '{id}' href '{href}' is not a local path"))
    })?;
    Ok(ManifestItem {
        id,
        path,
        media_type: attr(e, "media-type").unwrap_or_default(),
        properties: attr(e, "properties"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OPF: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="isbn">urn:isbn:000</dc:identifier>
    <dc:identifier id="uid">urn:uuid:1234</dc:identifier>
    <dc:title>Sample &amp; Co</dc:title>
    <dc:language>en</dc:language>
    <meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
    <meta property="rendition:layout">pre-paginated</meta>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c1" href="text/ch1.xhtml" media-type="application/xhtml+xml" properties="scripted svg"/>
    <item id="img" href="images/cover%20art.png" media-type="image/png"/>
  </manifest>
  <spine><itemref idref="c1"/></spine>
</package>"#;

    #[test]
    fn parses_version_metadata_and_items() {
        let doc = PackageDocument::parse("OEBPS/content.opf", OPF).unwrap();
        assert_eq!(doc.version, EpubVersion::V3);
        assert_eq!(doc.metadata.titles, vec!["Sample & Co".to_string()]);
        assert_eq!(doc.metadata.language.as_deref(), Some("en"));
        assert_eq!(doc.metadata.identifier.as_deref(), Some("urn:uuid:1234"));
        assert_eq!(doc.metadata.modified.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert!(doc.metadata.fixed_layout);
        assert_eq!(doc.items.len(), 3);
        assert_eq!(doc.items[1].path, "OEBPS/text/ch1.xhtml");
        assert_eq!(doc.items[2].path, "OEBPS/images/cover art.png");
    }

    #[test]
    fn item_properties_are_tokenized() {
        let doc = PackageDocument::parse("OEBPS/content.opf", OPF).unwrap();
        let chapter = doc.item_by_path("OEBPS/text/ch1.xhtml").unwrap();
        assert!(chapter.has_property("svg"));
        assert!(chapter.has_property("scripted"));
        assert!(!chapter.has_property("nav"));
    }

    #[test]
    fn missing_version_is_an_error() {
        let err = PackageDocument::parse("c.opf", b"<package><manifest/></package>").unwrap_err();
        assert!(matches!(err, OcfError::PackageDocument(_)));
    }

    #[test]
    fn unsupported_version_is_an_error() {
        let err = PackageDocument::parse("c.opf", br#"<package version="1.0"/>"#).unwrap_err();
        assert!(matches!(err, OcfError::Version(_)));
    }
}
