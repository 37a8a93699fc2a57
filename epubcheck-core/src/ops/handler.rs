use epubcheck_report::Feature;
use epubcheck_types::{MessageId, MessageLocation};

use crate::schema::{MATHML_NS, SVG_NS, XHTML_NS};
use crate::xml::{ParseContext, XmlElement, XmlHandler};

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

fn is_remote(url: &str) -> bool {
    let url = url.trim_start();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Link and resource reference checks shared by every EPUB version.
#[derive(Debug, Default)]
pub struct OpsHandler {
    references: usize,
}

impl OpsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outgoing references seen so far.
    pub fn references(&self) -> usize {
        self.references
    }

    fn reference_attribute(element: &XmlElement) -> Option<(&'static str, Option<&str>)> {
        if element.namespace.as_deref() == Some(XHTML_NS) {
            match element.local_name.as_str() {
                "a" | "link" | "area" => Some(("href", element.attribute("href"))),
                "img" | "script" | "audio" | "video" | "source" | "iframe" | "embed" => {
                    Some(("src", element.attribute("src")))
                }
                "object" => Some(("data", element.attribute("data"))),
                _ => None,
            }
        } else if element.namespace.as_deref() == Some(SVG_NS) {
            match element.local_name.as_str() {
                "a" | "image" | "use" => Some((
                    "href",
                    element
                        .attribute_ns(XLINK_NS, "href")
                        .or_else(|| element.attribute("href")),
                )),
                _ => None,
            }
        } else {
            None
        }
    }
}

impl XmlHandler for OpsHandler {
    fn start_element(&mut self, element: &XmlElement, ctx: &ParseContext<'_>) {
        let Some((attribute, value)) = Self::reference_attribute(element) else {
            return;
        };
        match value {
            Some(value) if value.trim().is_empty() => {
                ctx.message(MessageId::Htm008, &[attribute, &element.local_name]);
            }
            Some(value) => {
                self.references += 1;
                if is_remote(value) {
                    ctx.report().info(Some(ctx.path), Feature::Reference, value);
                }
            }
            // `a` without href is a plain anchor; the others are schema
            // errors the validators catch.
            None => {}
        }
    }
}

/// Manifest properties that describe document content.
const CONTENT_PROPERTIES: [&str; 4] = ["scripted", "svg", "mathml", "remote-resources"];

/// EPUB 3 handler: the shared checks plus agreement between the manifest
/// `properties` attribute and what the document actually contains.
#[derive(Debug)]
pub struct OpsHandler30 {
    base: OpsHandler,
    declared: Option<String>,
    found: [bool; 4],
}

impl OpsHandler30 {
    pub fn new(declared: Option<String>) -> Self {
        Self {
            base: OpsHandler::new(),
            declared,
            found: [false; 4],
        }
    }

    fn is_declared(&self, property: &str) -> bool {
        self.declared
            .as_deref()
            .is_some_and(|p| p.split_whitespace().any(|t| t == property))
    }

    fn mark(&mut self, property: &str) {
        if let Some(i) = CONTENT_PROPERTIES.iter().position(|p| *p == property) {
            self.found[i] = true;
        }
    }

    fn uses_remote_resource(element: &XmlElement) -> bool {
        let embedded = match element.local_name.as_str() {
            "img" | "audio" | "video" | "source" | "script" | "iframe" | "embed" => {
                element.attribute("src")
            }
            "object" => element.attribute("data"),
            "image" => element
                .attribute_ns(XLINK_NS, "href")
                .or_else(|| element.attribute("href")),
            "link" => element
                .attribute("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|r| r == "stylesheet"))
                .then(|| element.attribute("href"))
                .flatten(),
            _ => None,
        };
        embedded.is_some_and(is_remote)
    }
}

impl XmlHandler for OpsHandler30 {
    fn start_element(&mut self, element: &XmlElement, ctx: &ParseContext<'_>) {
        self.base.start_element(element, ctx);

        let ns = element.namespace.as_deref();
        let in_xhtml = ctx.media_type == "application/xhtml+xml";
        if element.local_name == "script" && (ns == Some(XHTML_NS) || ns == Some(SVG_NS)) {
            self.mark("scripted");
        }
        if ns == Some(XHTML_NS)
            && element
                .attributes
                .iter()
                .any(|a| a.namespace.is_none() && a.local_name.starts_with("on"))
        {
            self.mark("scripted");
        }
        if in_xhtml && ns == Some(SVG_NS) && element.local_name == "svg" {
            self.mark("svg");
        }
        if ns == Some(MATHML_NS) && element.local_name == "math" {
            self.mark("mathml");
        }
        if Self::uses_remote_resource(element) {
            self.mark("remote-resources");
        }
    }

    fn end_document(&mut self, ctx: &ParseContext<'_>) {
        let in_xhtml = ctx.media_type == "application/xhtml+xml";
        let location = MessageLocation::new(ctx.path, -1, -1);
        for (property, found) in CONTENT_PROPERTIES.into_iter().zip(self.found) {
            // `svg` only describes XHTML documents.
            if property == "svg" && !in_xhtml {
                continue;
            }
            let declared = self.is_declared(property);
            if found && !declared {
                ctx.report()
                    .message(MessageId::Opf014, location.clone(), &[property]);
            } else if declared && !found {
                ctx.report()
                    .message(MessageId::Opf015, location.clone(), &[property]);
            }
        }
        if self.found[0] {
            ctx.report().info(Some(ctx.path), Feature::HasScripts, "true");
        }
    }
}
