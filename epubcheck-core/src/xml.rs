//! Streaming XML driver for markup resources.
//!
//! [`XmlParser`] reads one document and feeds its events to schema
//! validator sessions first (in the order they were added) and to semantic
//! handlers after. Well-formedness errors are fatal for the document: they
//! are reported once as RSC-016 and parsing stops.

use std::borrow::Cow;
use std::io::{self, Read};

use epubcheck_report::Report;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use epubcheck_types::{EpubVersion, MessageId, MessageLocation};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use tracing::{debug, trace};

use crate::schema::SchemaValidator;

/// An attribute with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub local_name: String,
    pub value: String,
}

/// An element start tag with namespaces resolved and attribute values
/// unescaped. `xmlns` declarations are not listed as attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub local_name: String,
    pub attributes: Vec<XmlAttribute>,
}

impl XmlElement {
    /// True for the element `local_name` in namespace `namespace`.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(namespace)
    }

    /// Value of an attribute that has no namespace.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }
}

/// What a handler knows about the document being parsed.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub path: &'a str,
    pub media_type: &'a str,
    pub version: EpubVersion,
    report: &'a dyn Report,
    line: i64,
    column: i64,
}

impl<'a> ParseContext<'a> {
    pub fn report(&self) -> &'a dyn Report {
        self.report
    }

    /// Location of the event currently being dispatched.
    pub fn location(&self) -> MessageLocation {
        MessageLocation::new(self.path, self.line, self.column)
    }

    /// Reports `id` at the current location.
    pub fn message(&self, id: MessageId, args: &[&str]) {
        self.report.message(id, self.location(), args);
    }
}

/// Receives parse events for one document.
///
/// Both schema validator sessions and semantic handlers implement this.
/// Every method has an empty default so implementors only override what
/// they inspect.
pub trait XmlHandler {
    fn start_element(&mut self, element: &XmlElement, ctx: &ParseContext<'_>) {
        let _ = (element, ctx);
    }

    fn end_element(&mut self, element: &XmlElement, ctx: &ParseContext<'_>) {
        let _ = (element, ctx);
    }

    fn characters(&mut self, text: &str, ctx: &ParseContext<'_>) {
        let _ = (text, ctx);
    }

    /// Called once after the last event, also after a fatal error.
    fn end_document(&mut self, ctx: &ParseContext<'_>) {
        let _ = ctx;
    }
}

/// Parses one markup document and dispatches its events.
pub struct XmlParser<'a> {
    source: Box<dyn Read + 'a>,
    path: &'a str,
    media_type: &'a str,
    version: EpubVersion,
    report: &'a dyn Report,
    validators: Vec<Box<dyn XmlHandler + 'a>>,
    handlers: Vec<Box<dyn XmlHandler + 'a>>,
}

impl<'a> XmlParser<'a> {
    pub fn new(
        source: impl Read + 'a,
        path: &'a str,
        media_type: &'a str,
        version: EpubVersion,
        report: &'a dyn Report,
    ) -> Self {
        Self {
            source: Box::new(source),
            path,
            media_type,
            version,
            report,
            validators: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Attaches a validator. Validators see each event before any handler.
    pub fn add_validator(&mut self, validator: &'a dyn SchemaValidator) {
        debug!(path = %self.path, schema = %validator.schema_name(), "attaching validator");
        self.validators.push(validator.session());
    }

    pub fn add_handler(&mut self, handler: Box<dyn XmlHandler + 'a>) {
        self.handlers.push(handler);
    }

    /// Reads the whole document and dispatches its events.
    ///
    /// Only read failures are returned. Markup problems are reported.
    pub fn process(self) -> io::Result<()> {
        let XmlParser {
            mut source,
            path,
            media_type,
            version,
            report,
            validators,
            handlers,
        } = self;

        let mut raw = Vec::new();
        source.read_to_end(&mut raw)?;
        drop(source);
        let bytes = to_utf8(&raw);

        let mut dispatcher = Dispatcher {
            ctx: ParseContext {
                path,
                media_type,
                version,
                report,
                line: 1,
                column: 1,
            },
            sinks: validators.into_iter().chain(handlers).collect(),
            lines: LineIndex::new(&bytes),
        };
        dispatcher.run(&bytes);
        Ok(())
    }
}

/// Transcodes a document to UTF-8. The encoding comes from the byte order
/// mark, a BOM-less UTF-16 `<`, or the XML declaration, in that order.
fn to_utf8(raw: &[u8]) -> Cow<'_, [u8]> {
    let (encoding, skip) = match Encoding::for_bom(raw) {
        Some(found) => found,
        None => match raw {
            [b'<', 0, ..] => (UTF_16LE, 0),
            [0, b'<', ..] => (UTF_16BE, 0),
            _ => match declared_encoding(raw) {
                Some(encoding) => (encoding, 0),
                None => return Cow::Borrowed(raw),
            },
        },
    };
    if encoding == UTF_8 {
        return Cow::Borrowed(&raw[skip..]);
    }
    debug!(encoding = encoding.name(), "transcoding document to UTF-8");
    let (text, _) = encoding.decode_without_bom_handling(&raw[skip..]);
    Cow::Owned(text.into_owned().into_bytes())
}

/// The ASCII-compatible encoding named by `<?xml ... encoding="..."?>`.
fn declared_encoding(raw: &[u8]) -> Option<&'static Encoding> {
    let head = raw.strip_prefix(b"<?xml")?;
    let end = head.windows(2).position(|w| w == b"?>")?;
    let declaration = std::str::from_utf8(&head[..end]).ok()?;
    let value = declaration
        .split("encoding")
        .nth(1)?
        .trim_start()
        .strip_prefix('=')?
        .trim_start();
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let label = value[1..].split(quote).next()?;
    Encoding::for_label(label.as_bytes()).filter(|e| e.is_ascii_compatible())
}

struct Dispatcher<'a, 'b> {
    ctx: ParseContext<'a>,
    sinks: Vec<Box<dyn XmlHandler + 'a>>,
    lines: LineIndex<'b>,
}

impl Dispatcher<'_, '_> {
    fn run(&mut self, bytes: &[u8]) {
        let mut reader = NsReader::from_reader(bytes);
        reader.config_mut().expand_empty_elements = true;

        let mut open: Vec<XmlElement> = Vec::new();
        let mut seen_root = false;
        let mut buf = Vec::new();

        loop {
            let event_start = reader.buffer_position() as usize;
            let (resolved, event) = match reader.read_resolved_event_into(&mut buf) {
                Ok(pair) => pair,
                Err(e) => {
                    self.set_position(reader.buffer_position() as usize);
                    self.fatal(&e.to_string());
                    break;
                }
            };
            let namespace = namespace_of(resolved);
            self.set_position(event_start);

            match event {
                Event::Start(start) => {
                    if seen_root && open.is_empty() {
                        self.fatal("markup after the root element");
                        break;
                    }
                    seen_root = true;
                    let element = match resolve_element(&reader, namespace, &start) {
                        Ok(element) => element,
                        Err(reason) => {
                            self.fatal(&reason);
                            break;
                        }
                    };
                    trace!(path = %self.ctx.path, element = %element.local_name, "start");
                    for sink in &mut self.sinks {
                        sink.start_element(&element, &self.ctx);
                    }
                    open.push(element);
                }
                Event::End(_) => {
                    if let Some(element) = open.pop() {
                        for sink in &mut self.sinks {
                            sink.end_element(&element, &self.ctx);
                        }
                    }
                }
                Event::Text(text) => {
                    let text = match text.unescape() {
                        Ok(text) => text.into_owned(),
                        // Entities declared in a DTD we do not load.
                        Err(_) => String::from_utf8_lossy(&text).into_owned(),
                    };
                    self.characters(&text);
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    self.characters(&text);
                }
                Event::Eof => {
                    if let Some(element) = open.last() {
                        let reason = format!(
                            "XML document structures must start and end within the same entity; element \"{}\" is not closed",
                            element.local_name
                        );
                        self.fatal(&reason);
                    } else if !seen_root {
                        self.fatal("Premature end of file.");
                    }
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        for sink in &mut self.sinks {
            sink.end_document(&self.ctx);
        }
    }

    fn characters(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        for sink in &mut self.sinks {
            sink.characters(text, &self.ctx);
        }
    }

    fn fatal(&self, reason: &str) {
        debug!(path = %self.ctx.path, reason = %reason, "document is not well-formed");
        self.ctx.message(MessageId::Rsc016, &[reason]);
    }

    fn set_position(&mut self, offset: usize) {
        let (line, column) = self.lines.position(offset);
        self.ctx.line = line;
        self.ctx.column = column;
    }
}

fn namespace_of(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn resolve_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<XmlElement, String> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push(XmlAttribute {
            namespace: namespace_of(resolved),
            local_name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value,
        });
    }
    Ok(XmlElement {
        namespace,
        local_name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
    })
}

/// Maps byte offsets to 1-based line and column numbers.
struct LineIndex<'b> {
    bytes: &'b [u8],
    line_starts: Vec<usize>,
}

impl<'b> LineIndex<'b> {
    fn new(bytes: &'b [u8]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            bytes
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { bytes, line_starts }
    }

    fn position(&self, offset: usize) -> (i64, i64) {
        let offset = offset.min(self.bytes.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = offset - self.line_starts[line] + 1;
        (line as i64 + 1, column as i64)
    }
}
