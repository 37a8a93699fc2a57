//! JHOVE-style XML report.
//!
//! Collects messages and publication facts during a run and renders them
//! once at the end with [`XmlReport::generate`]. The layout follows the
//! JHOVE `repInfo` document: format, well-formedness status, messages
//! grouped by severity, then a property list.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use epubcheck_types::{Message, MessageId, MessageLocation, Severity};
use quick_xml::escape::escape;
use tracing::info;

use crate::collecting::lock;
use crate::{CollectingReport, Feature, Report};

const JHOVE_NS: &str = "http://hul.harvard.edu/ois/xml/ns/jhove";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const TOOL_NAME: &str = "epubcheck";

#[derive(Debug, Default)]
struct Facts {
    format_name: Option<String>,
    format_version: Option<String>,
    creation_date: Option<String>,
    modified_date: Option<String>,
    identifier: Option<String>,
    language: Option<String>,
    titles: Vec<String>,
    references: Vec<String>,
    has_encryption: bool,
    has_scripts: bool,
    has_fixed_layout: bool,
    has_audio: bool,
    has_video: bool,
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Report that renders a JHOVE XML document.
#[derive(Debug)]
pub struct XmlReport {
    messages: CollectingReport,
    epub_name: String,
    tool_version: String,
    facts: Mutex<Facts>,
}

impl XmlReport {
    /// `epub_name` is the checked file; only its final path segment is
    /// rendered as the `repInfo` uri.
    pub fn new(epub_name: impl Into<String>) -> Self {
        Self {
            messages: CollectingReport::new(),
            epub_name: epub_name.into(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            facts: Mutex::new(Facts::default()),
        }
    }

    /// Messages received so far, in emission order.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.messages()
    }

    /// True when no fatal error or error was recorded.
    pub fn is_well_formed(&self) -> bool {
        self.fatal_error_count() == 0 && self.error_count() == 0
    }

    /// Writes the report to a file, replacing it if it exists.
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.generate(&mut out)?;
        out.flush()?;
        info!(path = %path.display(), "XML report written");
        Ok(())
    }

    /// Renders the report.
    pub fn generate<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let facts = lock(&self.facts);
        let messages = self.messages.messages();
        let mut w = Indented { out, depth: 0 };

        w.line(r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        w.open(&format!(
            r#"<jhove xmlns="{JHOVE_NS}" xmlns:xsi="{XSI_NS}" name="{TOOL_NAME}" release="{}">"#,
            escape(self.tool_version.as_str())
        ))?;
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string();
        w.element("date", Some(now.as_str()))?;
        w.open(&format!(
            r#"<repInfo uri="{}">"#,
            escape(file_name(&self.epub_name))
        ))?;
        w.element("created", facts.creation_date.as_deref())?;
        w.element("lastModified", facts.modified_date.as_deref())?;
        w.element(
            "format",
            Some(facts.format_name.as_deref().unwrap_or("application/octet-stream")),
        )?;
        w.element("version", facts.format_version.as_deref())?;
        let status = if self.is_well_formed() {
            "Well-formed"
        } else {
            "Not well-formed"
        };
        w.element("status", Some(status))?;

        if !messages.is_empty() {
            w.open("<messages>")?;
            for severity in [
                Severity::Fatal,
                Severity::Warning,
                Severity::Error,
                Severity::Hint,
            ] {
                for message in messages.iter().filter(|m| m.severity == severity) {
                    let text = format!("{}: {}", severity.label(), render_message(message));
                    w.element("message", Some(text.as_str()))?;
                }
            }
            w.close("</messages>")?;
        }

        w.element("mimeType", facts.format_name.as_deref())?;
        w.open("<properties>")?;
        w.property("Language", facts.language.as_deref(), "String")?;
        w.open(r#"<property><name>Info</name><values arity="List" type="Property">"#)?;
        w.property("Identifier", facts.identifier.as_deref(), "String")?;
        w.property("CreationDate", facts.creation_date.as_deref(), "Date")?;
        w.property("ModDate", facts.modified_date.as_deref(), "Date")?;
        w.property_list("Title", &facts.titles, "String")?;
        w.close("</values></property>")?;

        if !facts.references.is_empty() {
            w.open(r#"<property><name>References</name><values arity="List" type="Property">"#)?;
            for reference in &facts.references {
                w.property("Reference", Some(reference.as_str()), "String")?;
            }
            w.close("</values></property>")?;
        }

        for (name, set) in [
            ("hasEncryption", facts.has_encryption),
            ("hasAudio", facts.has_audio),
            ("hasVideo", facts.has_video),
            ("hasFixedLayout", facts.has_fixed_layout),
            ("hasScripts", facts.has_scripts),
        ] {
            if set {
                w.property(name, Some("true"), "Boolean")?;
            }
        }
        w.close("</properties>")?;
        w.close("</repInfo>")?;
        w.close("</jhove>")?;
        Ok(())
    }
}

impl Report for XmlReport {
    fn message(&self, id: MessageId, location: MessageLocation, args: &[&str]) {
        self.messages.message(id, location, args);
    }

    fn info(&self, _path: Option<&str>, feature: Feature, value: &str) {
        let mut facts = lock(&self.facts);
        match feature {
            Feature::FormatName => facts.format_name = Some(value.to_string()),
            Feature::FormatVersion => facts.format_version = Some(value.to_string()),
            Feature::CreationDate => facts.creation_date = Some(value.to_string()),
            Feature::ModifiedDate => facts.modified_date = Some(value.to_string()),
            Feature::UniqueIdent => facts.identifier = Some(value.to_string()),
            Feature::DcLanguage => facts.language = Some(value.to_string()),
            Feature::DcTitle => push_unique(&mut facts.titles, value),
            Feature::Reference => push_unique(&mut facts.references, value),
            Feature::DeclaredMimetype => {
                if value.starts_with("audio/") {
                    facts.has_audio = true;
                } else if value.starts_with("video/") {
                    facts.has_video = true;
                }
            }
            Feature::HasEncryption => facts.has_encryption = true,
            Feature::HasScripts => facts.has_scripts = true,
            Feature::HasFixedLayout => facts.has_fixed_layout = true,
        }
    }

    fn fatal_error_count(&self) -> usize {
        self.messages.fatal_error_count()
    }

    fn error_count(&self) -> usize {
        self.messages.error_count()
    }

    fn warning_count(&self) -> usize {
        self.messages.warning_count()
    }
}

/// `/path(line): text`, with the path and line dropped when unknown.
fn render_message(message: &Message) -> String {
    let mut rendered = String::new();
    if !message.location.path.is_empty() {
        rendered.push('/');
        rendered.push_str(&message.location.path);
    }
    if message.location.has_line() {
        rendered.push_str(&format!("({})", message.location.line));
    }
    rendered.push_str(": ");
    rendered.push_str(&message.text());
    rendered
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

struct Indented<'w, W: Write> {
    out: &'w mut W,
    depth: usize,
}

impl<W: Write> Indented<'_, W> {
    fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{:indent$}{text}", "", indent = self.depth)
    }

    fn open(&mut self, text: &str) -> io::Result<()> {
        self.line(text)?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, text: &str) -> io::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        self.line(text)
    }

    /// Writes `<name>value</name>`; blank values are skipped.
    fn element(&mut self, name: &str, value: Option<&str>) -> io::Result<()> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.line(&format!("<{name}>{}</{name}>", escape(v))),
            _ => Ok(()),
        }
    }

    fn property(&mut self, name: &str, value: Option<&str>, kind: &str) -> io::Result<()> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.line(&format!(
                r#"<property><name>{name}</name><values arity="Scalar" type="{kind}"><value>{}</value></values></property>"#,
                escape(v)
            )),
            _ => Ok(()),
        }
    }

    fn property_list(&mut self, name: &str, values: &[String], kind: &str) -> io::Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let arity = if values.len() == 1 { "Scalar" } else { "Array" };
        let mut text = format!(
            r#"<property><name>{name}</name><values arity="{arity}" type="{kind}">"#
        );
        for value in values {
            text.push_str(&format!("<value>{}</value>", escape(value.as_str())));
        }
        text.push_str("</values></property>");
        self.line(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(file_name("/tmp/books/a.epub"), "a.epub");
        assert_eq!(file_name("C:\\books\\b.epub"), "b.epub");
        assert_eq!(file_name("c.epub"), "c.epub");
    }

    #[test]
    fn render_message_omits_unknown_line() {
        let msg = Message::new(
            MessageId::Opf051,
            MessageLocation::unknown("img/a.png"),
            vec![],
        );
        assert_eq!(
            render_message(&msg),
            "/img/a.png: Image dimensions exceed recommended size."
        );
    }

    #[test]
    fn render_message_includes_known_line() {
        let msg = Message::new(
            MessageId::Rsc005,
            MessageLocation::new("ch1.xhtml", 4, 2),
            vec!["duplicate id".into()],
        );
        assert_eq!(
            render_message(&msg),
            "/ch1.xhtml(4): Error while parsing file: duplicate id"
        );
    }
}
