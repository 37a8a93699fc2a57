mod common;

use std::sync::Arc;

use common::{UnreadablePackage, builder, container_path, open, xhtml};
use epubcheck_core::schema::{Assertion, AssertionValidator};
use epubcheck_core::{
    ContentChecker, OpsChecker, Resource, ValidatorKey, ValidatorPair, ValidatorRegistry,
};
use epubcheck_report::{CollectingReport, Report};
use epubcheck_types::{EpubVersion, MessageId, MessageLocation};
use pretty_assertions::assert_eq;

fn check(
    version: EpubVersion,
    href: &str,
    media_type: &str,
    data: Vec<u8>,
    properties: Option<&str>,
) -> (CollectingReport, bool) {
    let mut b = builder(version);
    b = match properties {
        Some(p) => b.item_with_properties("doc", href, media_type, p, data),
        None => b.item("doc", href, media_type, data),
    };
    let package = open(b);
    let report = CollectingReport::new();
    let mut resource = Resource::new(container_path(href), media_type);
    if let Some(p) = properties {
        resource = resource.with_properties(p);
    }
    let passed = OpsChecker::new(&package, &report, resource, version).validate();
    (report, passed)
}

#[test]
fn valid_documents_pass_in_both_versions() {
    for version in [EpubVersion::V2, EpubVersion::V3] {
        let (report, passed) = check(
            version,
            "c1.xhtml",
            "application/xhtml+xml",
            xhtml(r#"<p id="a">One</p><p id="b"><a href="c2.xhtml">Two</a></p>"#),
            None,
        );
        assert!(passed, "{version}: {:?}", report.messages());
        assert!(report.is_empty());
    }
}

#[test]
fn schema_violation_fails_validation() {
    let (report, passed) = check(
        EpubVersion::V3,
        "c1.xhtml",
        "application/xhtml+xml",
        xhtml(r#"<p id="x"/><p id="x"/>"#),
        None,
    );
    assert!(!passed);
    let messages = report.messages_with_id(MessageId::Rsc005);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].location.path, "OEBPS/c1.xhtml");
    assert_eq!(messages[0].location.line, 5);
}

#[test]
fn malformed_markup_is_a_single_fatal_error() {
    let (report, passed) = check(
        EpubVersion::V2,
        "c1.xhtml",
        "application/xhtml+xml",
        b"<html xmlns=\"http://www.w3.org/1999/xhtml\"><head></body></html>".to_vec(),
        None,
    );
    assert!(!passed);
    assert_eq!(report.count(MessageId::Rsc016), 1);
    assert_eq!(report.fatal_error_count(), 1);
}

fn utf16le(doc: Vec<u8>) -> Vec<u8> {
    let text = String::from_utf8(doc).unwrap().replace("UTF-8", "UTF-16");
    let mut data = vec![0xFF, 0xFE];
    data.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    data
}

#[test]
fn utf16_documents_are_well_formed() {
    let (report, passed) = check(
        EpubVersion::V3,
        "c1.xhtml",
        "application/xhtml+xml",
        utf16le(xhtml(r#"<p id="a">Café</p>"#)),
        None,
    );
    assert!(passed, "{:?}", report.messages());
    assert!(report.is_empty());
}

#[test]
fn utf16_schema_violations_keep_their_lines() {
    let (report, passed) = check(
        EpubVersion::V3,
        "c1.xhtml",
        "application/xhtml+xml",
        utf16le(xhtml(r#"<p id="x"/><p id="x"/>"#)),
        None,
    );
    assert!(!passed);
    assert_eq!(report.count(MessageId::Rsc016), 0);
    let messages = report.messages_with_id(MessageId::Rsc005);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].location.line, 5);
}

#[test]
fn warnings_alone_fail_validation() {
    let (report, passed) = check(
        EpubVersion::V2,
        "c1.xhtml",
        "application/xhtml+xml",
        xhtml(r#"<p><a href="">empty</a></p>"#),
        None,
    );
    assert!(!passed);
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.warning_count(), 1);
    assert_eq!(report.count(MessageId::Htm008), 1);
}

#[test]
fn remote_references_are_facts_not_messages() {
    let (report, passed) = check(
        EpubVersion::V2,
        "c1.xhtml",
        "application/xhtml+xml",
        xhtml(r#"<p><a href="https://example.org/">remote</a></p>"#),
        None,
    );
    assert!(passed);
    assert!(report.is_empty());
    assert_eq!(report.infos().len(), 1);
}

#[test]
fn epub3_properties_are_checked_against_content() {
    let (report, passed) = check(
        EpubVersion::V3,
        "c1.xhtml",
        "application/xhtml+xml",
        xhtml("<script>let x = 1;</script>"),
        Some("mathml"),
    );
    assert!(!passed);
    let undeclared = report.messages_with_id(MessageId::Opf014);
    let unused = report.messages_with_id(MessageId::Opf015);
    assert_eq!(undeclared.len(), 1);
    assert_eq!(undeclared[0].args, vec!["scripted".to_string()]);
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].args, vec!["mathml".to_string()]);
}

#[test]
fn epub2_ignores_content_properties() {
    let (report, passed) = check(
        EpubVersion::V2,
        "c1.xhtml",
        "application/xhtml+xml",
        xhtml("<script>let x = 1;</script>"),
        None,
    );
    assert!(passed, "{:?}", report.messages());
}

#[test]
fn svg_documents_use_the_svg_grammar() {
    let (report, passed) = check(
        EpubVersion::V3,
        "fig.svg",
        "image/svg+xml",
        xhtml("<p/>"),
        None,
    );
    assert!(!passed);
    assert_eq!(report.count(MessageId::Rsc005), 1);
    assert!(report.messages()[0].text().contains("expected element \"svg\""));
}

#[test]
fn unregistered_media_type_skips_schema_layer_only() {
    // Invalid as XHTML in three ways, but no grammar is registered for
    // the version-3 key in this registry.
    let registry = ValidatorRegistry::default();
    let package = open(builder(EpubVersion::V3).item(
        "doc",
        "c1.xhtml",
        "application/xhtml+xml",
        br#"<body xmlns="http://www.w3.org/1999/xhtml"><a href=""/><p id="x"/><p id="x"/></body>"#.to_vec(),
    ));
    let report = CollectingReport::new();
    let passed = OpsChecker::new(
        &package,
        &report,
        Resource::new("OEBPS/c1.xhtml", "application/xhtml+xml"),
        EpubVersion::V3,
    )
    .with_registry(&registry)
    .validate();

    assert!(!passed);
    assert_eq!(report.count(MessageId::Rsc005), 0);
    assert_eq!(report.count(MessageId::Htm008), 1);
}

#[test]
fn custom_registry_entries_are_used() {
    let ids = AssertionValidator::new("custom-ids.sch", &[Assertion::UniqueIds]);
    let registry = ValidatorRegistry::from_entries([(
        ValidatorKey::new("application/xhtml+xml", EpubVersion::V3),
        ValidatorPair::new(None, Some(Arc::new(ids))),
    )])
    .unwrap();

    let package = open(builder(EpubVersion::V3).item(
        "doc",
        "c1.xhtml",
        "application/xhtml+xml",
        br#"<body xmlns="http://www.w3.org/1999/xhtml"><p id="x"/><p id="x"/></body>"#.to_vec(),
    ));
    let report = CollectingReport::new();
    OpsChecker::new(
        &package,
        &report,
        Resource::new("OEBPS/c1.xhtml", "application/xhtml+xml"),
        EpubVersion::V3,
    )
    .with_registry(&registry)
    .validate();

    // Only the assertion layer ran: duplicate ids, but no complaint about
    // the missing html root.
    assert_eq!(report.count(MessageId::Rsc005), 1);
    assert!(report.messages()[0].text().contains("Duplicate 'x'"));
}

#[test]
fn read_failure_reports_pkg_008_once() {
    let package = UnreadablePackage;
    let report = CollectingReport::new();
    let passed = OpsChecker::new(
        &package,
        &report,
        Resource::new("OEBPS/c1.xhtml", "application/xhtml+xml"),
        EpubVersion::V3,
    )
    .validate();

    assert!(!passed);
    let messages = report.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, MessageId::Pkg008);
    assert_eq!(messages[0].location, MessageLocation::new("OEBPS/c1.xhtml", 0, 0));
    assert_eq!(messages[0].args, vec!["OEBPS/c1.xhtml".to_string()]);
}

#[test]
fn run_checks_validates_after_the_gate() {
    let package = open(builder(EpubVersion::V3).item(
        "doc",
        "c1.xhtml",
        "application/xhtml+xml",
        xhtml(r#"<a href=" "/>"#),
    ));
    let report = CollectingReport::new();
    OpsChecker::new(
        &package,
        &report,
        Resource::new("OEBPS/c1.xhtml", "application/xhtml+xml"),
        EpubVersion::V3,
    )
    .run_checks();
    assert_eq!(report.count(MessageId::Htm008), 1);
}
