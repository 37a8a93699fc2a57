//! Schema validators for markup documents.
//!
//! A [`SchemaValidator`] is a compiled, immutable schema. It is shared by
//! every document and every thread; all per-document state lives in the
//! session it hands out for each parse.
//!
//! Two kinds are provided:
//! - [`GrammarValidator`] checks the document skeleton: root element and
//!   namespace, then the required children of the root in order.
//! - [`AssertionValidator`] checks rule-based constraints such as unique
//!   IDs.
//!
//! Violations are reported as RSC-005 at the offending event.

use std::collections::HashSet;
use std::fmt;

use epubcheck_types::MessageId;

use crate::xml::{ParseContext, XmlElement, XmlHandler};

pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// An immutable compiled schema.
pub trait SchemaValidator: Send + Sync + fmt::Debug {
    /// Schema resource name, e.g. `schema/30/epub-xhtml-30.rnc`.
    fn schema_name(&self) -> &str;

    /// Starts validating one document.
    fn session(&self) -> Box<dyn XmlHandler + '_>;
}

/// Root element and ordered required children.
#[derive(Debug)]
pub struct GrammarValidator {
    name: &'static str,
    namespace: &'static str,
    root: &'static str,
    required_children: &'static [&'static str],
}

impl GrammarValidator {
    pub const fn new(
        name: &'static str,
        namespace: &'static str,
        root: &'static str,
        required_children: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            namespace,
            root,
            required_children,
        }
    }
}

impl SchemaValidator for GrammarValidator {
    fn schema_name(&self) -> &str {
        self.name
    }

    fn session(&self) -> Box<dyn XmlHandler + '_> {
        Box::new(GrammarSession {
            grammar: self,
            depth: 0,
            next_required: 0,
            root_ok: false,
        })
    }
}

struct GrammarSession<'g> {
    grammar: &'g GrammarValidator,
    depth: usize,
    next_required: usize,
    root_ok: bool,
}

impl XmlHandler for GrammarSession<'_> {
    fn start_element(&mut self, element: &XmlElement, ctx: &ParseContext<'_>) {
        self.depth += 1;
        let grammar = self.grammar;
        match self.depth {
            1 => {
                self.root_ok = element.is(grammar.namespace, grammar.root);
                if !self.root_ok {
                    let reason = format!(
                        "element \"{}\" not allowed here; expected element \"{}\" ({})",
                        element.local_name, grammar.root, grammar.namespace
                    );
                    ctx.message(MessageId::Rsc005, &[&reason]);
                }
            }
            2 if self.root_ok && !grammar.required_children.is_empty() => {
                let expected = grammar.required_children.get(self.next_required);
                if expected.is_some_and(|name| element.is(grammar.namespace, name)) {
                    self.next_required += 1;
                } else if self.next_required < grammar.required_children.len()
                    || grammar
                        .required_children
                        .iter()
                        .any(|name| element.local_name == *name)
                {
                    let reason = format!(
                        "element \"{}\" not allowed here; expected element \"{}\"",
                        element.local_name,
                        expected.copied().unwrap_or(grammar.root)
                    );
                    ctx.message(MessageId::Rsc005, &[&reason]);
                }
            }
            _ => {}
        }
    }

    fn end_element(&mut self, _element: &XmlElement, ctx: &ParseContext<'_>) {
        if self.depth == 1 && self.root_ok {
            if let Some(missing) = self.grammar.required_children.get(self.next_required) {
                let reason = format!(
                    "element \"{}\" incomplete; missing required element \"{}\"",
                    self.grammar.root, missing
                );
                ctx.message(MessageId::Rsc005, &[&reason]);
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }
}

/// A single rule checked by an [`AssertionValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assertion {
    /// `id` (and `xml:id`) values are unique within the document.
    UniqueIds,
    /// The element must not appear inside another element of the same name.
    NoNesting {
        namespace: &'static str,
        local_name: &'static str,
    },
}

/// Rule-based validator.
#[derive(Debug)]
pub struct AssertionValidator {
    name: &'static str,
    assertions: &'static [Assertion],
}

impl AssertionValidator {
    pub const fn new(name: &'static str, assertions: &'static [Assertion]) -> Self {
        Self { name, assertions }
    }
}

impl SchemaValidator for AssertionValidator {
    fn schema_name(&self) -> &str {
        self.name
    }

    fn session(&self) -> Box<dyn XmlHandler + '_> {
        Box::new(AssertionSession {
            assertions: self.assertions,
            ids: HashSet::new(),
            open: vec![0; self.assertions.len()],
        })
    }
}

struct AssertionSession {
    assertions: &'static [Assertion],
    ids: HashSet<String>,
    // Open element count per NoNesting rule, indexed like `assertions`.
    open: Vec<usize>,
}

impl XmlHandler for AssertionSession {
    fn start_element(&mut self, element: &XmlElement, ctx: &ParseContext<'_>) {
        for (rule, open) in self.assertions.iter().zip(self.open.iter_mut()) {
            match *rule {
                Assertion::UniqueIds => {
                    let id = element
                        .attribute("id")
                        .or_else(|| element.attribute_ns(XML_NS, "id"));
                    if let Some(id) = id {
                        if !self.ids.insert(id.to_string()) {
                            let reason = format!("Duplicate '{id}'");
                            ctx.message(MessageId::Rsc005, &[&reason]);
                        }
                    }
                }
                Assertion::NoNesting {
                    namespace,
                    local_name,
                } => {
                    if element.is(namespace, local_name) {
                        if *open > 0 {
                            let reason = format!(
                                "The {local_name} element must not contain any nested {local_name} elements."
                            );
                            ctx.message(MessageId::Rsc005, &[&reason]);
                        }
                        *open += 1;
                    }
                }
            }
        }
    }

    fn end_element(&mut self, element: &XmlElement, _ctx: &ParseContext<'_>) {
        for (rule, open) in self.assertions.iter().zip(self.open.iter_mut()) {
            if let Assertion::NoNesting {
                namespace,
                local_name,
            } = *rule
            {
                if element.is(namespace, local_name) {
                    *open = open.saturating_sub(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlParser;
    use epubcheck_report::CollectingReport;
    use epubcheck_types::EpubVersion;

    static XHTML: GrammarValidator =
        GrammarValidator::new("test.rng", XHTML_NS, "html", &["head", "body"]);
    static IDS: AssertionValidator = AssertionValidator::new(
        "test.sch",
        &[
            Assertion::UniqueIds,
            Assertion::NoNesting {
                namespace: XHTML_NS,
                local_name: "a",
            },
        ],
    );

    fn validate(doc: &str, validator: &'static dyn SchemaValidator) -> CollectingReport {
        let report = CollectingReport::new();
        let mut parser = XmlParser::new(
            doc.as_bytes(),
            "c.xhtml",
            "application/xhtml+xml",
            EpubVersion::V3,
            &report,
        );
        parser.add_validator(validator);
        parser.process().unwrap();
        report
    }

    #[test]
    fn well_formed_skeleton_passes() {
        let doc = r#"<html xmlns="http://www.w3.org/1999/xhtml"><head/><body><p/></body></html>"#;
        assert!(validate(doc, &XHTML).is_empty());
    }

    #[test]
    fn wrong_root_is_reported() {
        let doc = r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;
        let report = validate(doc, &XHTML);
        assert_eq!(report.count(MessageId::Rsc005), 1);
    }

    #[test]
    fn missing_body_is_reported() {
        let doc = r#"<html xmlns="http://www.w3.org/1999/xhtml"><head/></html>"#;
        let report = validate(doc, &XHTML);
        assert_eq!(report.count(MessageId::Rsc005), 1);
        assert!(report.messages()[0].text().contains("\"body\""));
    }

    #[test]
    fn body_before_head_is_reported() {
        let doc = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body/><head/></html>"#;
        let report = validate(doc, &XHTML);
        assert!(report.count(MessageId::Rsc005) >= 1);
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let doc = r#"<html xmlns="http://www.w3.org/1999/xhtml"><p id="a"/><p id="b"/><p id="a"/></html>"#;
        let report = validate(doc, &IDS);
        assert_eq!(report.count(MessageId::Rsc005), 1);
        assert!(report.messages()[0].text().contains("Duplicate 'a'"));
    }

    #[test]
    fn nested_anchor_is_reported() {
        let doc = r#"<html xmlns="http://www.w3.org/1999/xhtml"><a><span><a/></span></a><a/></html>"#;
        let report = validate(doc, &IDS);
        assert_eq!(report.count(MessageId::Rsc005), 1);
    }

    #[test]
    fn sessions_do_not_share_state() {
        let doc = r#"<html xmlns="http://www.w3.org/1999/xhtml"><p id="a"/></html>"#;
        assert!(validate(doc, &IDS).is_empty());
        assert!(validate(doc, &IDS).is_empty());
    }
}
