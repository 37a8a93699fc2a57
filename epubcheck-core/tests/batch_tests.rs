mod common;

use common::{builder, open, png, xhtml};
use epubcheck_core::{BatchChecker, ResourceOutcome};
use epubcheck_ocf::OcfZipPackage;
use epubcheck_report::{CollectingReport, Feature, Report};
use epubcheck_types::{EpubVersion, MessageId};
use pretty_assertions::assert_eq;

fn publication() -> OcfZipPackage {
    open(
        builder(EpubVersion::V3)
            .item("c1", "c1.xhtml", "application/xhtml+xml", xhtml("<p>clean</p>"))
            .item("c2", "c2.xhtml", "application/xhtml+xml", xhtml(r#"<p id="d"/><p id="d"/>"#))
            .item("cover", "cover.png", "image/png", png(400, 600, 0))
            .item("wide", "wide.png", "image/png", png(4000, 600, 0))
            .item("css", "style.css", "text/css", b"p { margin: 0 }".to_vec())
            .missing_item("gone", "gone.xhtml", "application/xhtml+xml"),
    )
}

#[test]
fn outcomes_follow_manifest_order() {
    let package = publication();
    let report = CollectingReport::new();
    let batch = BatchChecker::from_package(&package, &report).unwrap();
    assert_eq!(batch.version(), EpubVersion::V3);

    let summary = batch.run();
    let outcomes: Vec<_> = summary
        .results
        .iter()
        .map(|r| (r.path.as_str(), r.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("OEBPS/c1.xhtml", ResourceOutcome::Passed),
            ("OEBPS/c2.xhtml", ResourceOutcome::Failed),
            ("OEBPS/cover.png", ResourceOutcome::Passed),
            ("OEBPS/wide.png", ResourceOutcome::Failed),
            ("OEBPS/style.css", ResourceOutcome::Skipped),
            ("OEBPS/gone.xhtml", ResourceOutcome::Failed),
        ]
    );
    assert_eq!(
        (summary.passed(), summary.failed(), summary.skipped()),
        (2, 3, 1)
    );
    assert_eq!(report.count(MessageId::Rsc001), 1);
    assert_eq!(report.count(MessageId::Rsc005), 1);
    assert_eq!(report.count(MessageId::Opf051), 1);
}

#[test]
fn parallel_run_agrees_with_sequential_run() {
    let package = publication();

    let sequential_report = CollectingReport::new();
    let sequential = BatchChecker::from_package(&package, &sequential_report)
        .unwrap()
        .run();

    let parallel_report = CollectingReport::new();
    let parallel = BatchChecker::from_package(&package, &parallel_report)
        .unwrap()
        .run_parallel();

    assert_eq!(sequential, parallel);
    assert_eq!(sequential_report.error_count(), parallel_report.error_count());
    assert_eq!(sequential_report.warning_count(), parallel_report.warning_count());

    let mut a: Vec<_> = sequential_report.messages().into_iter().map(|m| m.to_string()).collect();
    let mut b: Vec<_> = parallel_report.messages().into_iter().map(|m| m.to_string()).collect();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn clean_resources_stay_clean_while_others_fail_in_parallel() {
    let mut b = builder(EpubVersion::V2);
    for i in 0..24 {
        let body = if i % 2 == 0 {
            "<p>ok</p>".to_string()
        } else {
            r#"<p><a href="">bad</a></p>"#.to_string()
        };
        b = b.item(
            &format!("c{i}"),
            &format!("c{i}.xhtml"),
            "application/xhtml+xml",
            xhtml(&body),
        );
    }
    let package = open(b);
    let report = CollectingReport::new();
    let summary = BatchChecker::from_package(&package, &report)
        .unwrap()
        .run_parallel();

    for (i, result) in summary.results.iter().enumerate() {
        let expected = if i % 2 == 0 {
            ResourceOutcome::Passed
        } else {
            ResourceOutcome::Failed
        };
        assert_eq!(result.outcome, expected, "{}", result.path);
    }
    assert_eq!(report.count(MessageId::Htm008), 12);
}

#[test]
fn publication_facts_are_reported() {
    let package = publication();
    let report = CollectingReport::new();
    BatchChecker::from_package(&package, &report).unwrap();

    let infos = report.infos();
    let value_of = |feature: Feature| {
        infos
            .iter()
            .find(|(_, f, _)| *f == feature)
            .map(|(_, _, v)| v.clone())
    };
    assert_eq!(value_of(Feature::FormatName).as_deref(), Some("application/epub+zip"));
    assert_eq!(value_of(Feature::FormatVersion).as_deref(), Some("3.0"));
    assert_eq!(value_of(Feature::DcTitle).as_deref(), Some("Core Fixture"));
    assert_eq!(value_of(Feature::DcLanguage).as_deref(), Some("en"));
    let declared = infos
        .iter()
        .filter(|(_, f, _)| *f == Feature::DeclaredMimetype)
        .count();
    assert_eq!(declared, 6);
    assert!(report.messages().is_empty());
}
