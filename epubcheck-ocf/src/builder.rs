//! Fluent builder for small EPUB zip containers.

use std::io::{Cursor, Write};

use epubcheck_types::EpubVersion;
use quick_xml::escape::escape;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::{CONTAINER_ENTRY, ENCRYPTION_ENTRY, EPUB_MIMETYPE, MIMETYPE_ENTRY, OcfError};

const OPF_DIR: &str = "OEBPS/";
const OPF_ENTRY: &str = "OEBPS/content.opf";

struct BuilderItem {
    id: String,
    href: String,
    media_type: String,
    properties: Option<String>,
    data: Option<Vec<u8>>,
}

/// Builds an OCF zip with a generated container and package document.
///
/// Manifest hrefs are relative to `OEBPS/`, where the package document is
/// written; an item added with href `images/a.png` lands at container path
/// `OEBPS/images/a.png`.
pub struct PackageBuilder {
    version: EpubVersion,
    title: String,
    items: Vec<BuilderItem>,
    extra: Vec<(String, Vec<u8>)>,
    encrypted: Vec<(String, String)>,
}

impl PackageBuilder {
    pub fn new(version: EpubVersion) -> Self {
        Self {
            version,
            title: "Untitled".into(),
            items: Vec::new(),
            extra: Vec::new(),
            encrypted: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn item(mut self, id: &str, href: &str, media_type: &str, data: Vec<u8>) -> Self {
        self.items.push(BuilderItem {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: None,
            data: Some(data),
        });
        self
    }

    pub fn item_with_properties(
        mut self,
        id: &str,
        href: &str,
        media_type: &str,
        properties: &str,
        data: Vec<u8>,
    ) -> Self {
        self.items.push(BuilderItem {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: Some(properties.into()),
            data: Some(data),
        });
        self
    }

    /// Declares a manifest item without storing its bytes.
    pub fn missing_item(mut self, id: &str, href: &str, media_type: &str) -> Self {
        self.items.push(BuilderItem {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: None,
            data: None,
        });
        self
    }

    /// Stores a raw entry at a container path, outside the manifest.
    pub fn entry(mut self, path: &str, data: Vec<u8>) -> Self {
        self.extra.push((path.into(), data));
        self
    }

    /// Lists a container path in `encryption.xml` under `algorithm`.
    pub fn encrypt(mut self, path: &str, algorithm: &str) -> Self {
        self.encrypted.push((path.into(), algorithm.into()));
        self
    }

    /// Builds the zip archive and returns the raw bytes.
    pub fn build(self) -> Result<Vec<u8>, OcfError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file(MIMETYPE_ENTRY, stored)?;
        zip.write_all(EPUB_MIMETYPE.as_bytes())?;

        zip.start_file(CONTAINER_ENTRY, deflated)?;
        zip.write_all(self.container_xml().as_bytes())?;

        if !self.encrypted.is_empty() {
            zip.start_file(ENCRYPTION_ENTRY, deflated)?;
            zip.write_all(self.encryption_xml().as_bytes())?;
        }

        zip.start_file(OPF_ENTRY, deflated)?;
        zip.write_all(self.package_xml().as_bytes())?;

        for item in &self.items {
            if let Some(data) = &item.data {
                zip.start_file(format!("{OPF_DIR}{}", item.href), deflated)?;
                zip.write_all(data)?;
            }
        }

        for (path, data) in &self.extra {
            zip.start_file(path.as_str(), deflated)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn container_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{OPF_ENTRY}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#
        )
    }

    fn encryption_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container" xmlns:enc="http://www.w3.org/2001/04/xmlenc#">
"#,
        );
        for (path, algorithm) in &self.encrypted {
            xml.push_str(&format!(
                r#"  <enc:EncryptedData><enc:EncryptionMethod Algorithm="{}"/><enc:CipherData><enc:CipherReference URI="{}"/></enc:CipherData></enc:EncryptedData>
"#,
                escape(algorithm.as_str()),
                escape(path.as_str())
            ));
        }
        xml.push_str("</encryption>\n");
        xml
    }

    fn package_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="{}" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:00000000-0000-0000-0000-000000000000</dc:identifier>
    <dc:title>{}</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
"#,
            self.version.as_package_attr(),
            escape(self.title.as_str())
        );
        for item in &self.items {
            let properties = item
                .properties
                .as_ref()
                .map(|p| format!(r#" properties="{}""#, escape(p.as_str())))
                .unwrap_or_default();
            xml.push_str(&format!(
                r#"    <item id="{}" href="{}" media-type="{}"{properties}/>
"#,
                escape(item.id.as_str()),
                escape(item.href.as_str()),
                escape(item.media_type.as_str())
            ));
        }
        xml.push_str("  </manifest>\n</package>\n");
        xml
    }
}
