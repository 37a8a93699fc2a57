//! Property-based tests for the image heuristics and the pass/fail verdict.
//!
//! - Oversized-dimension and oversized-payload messages fire exactly when
//!   their own threshold is reached, independently of each other
//! - The header check never reports a mismatch for a truncated resource
//! - `validate()` passes iff no fatal error, error or warning was reported

mod common;

use common::{builder, open, png, xhtml};
use epubcheck_core::bitmap::{HEIGHT_MAX, WIDTH_MAX, header_matches};
use epubcheck_core::{BitmapChecker, ContentChecker, OpsChecker, Resource};
use epubcheck_report::{CollectingReport, Report};
use epubcheck_types::{EpubVersion, MessageId};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn dimension_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![1u32..5000, Just(WIDTH_MAX), Just(HEIGHT_MAX), Just(WIDTH_MAX - 1)]
}

fn media_type_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["image/jpeg", "image/gif", "image/png", "image/bmp"])
}

/// Paragraphs that are either clean, empty links (warnings) or duplicate
/// ids (errors).
fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..3, 0..6).prop_map(|kinds| {
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| match kind {
                0 => format!("<p>text {i}</p>"),
                1 => r#"<p><a href="">link</a></p>"#.to_string(),
                _ => r#"<p id="dup">dup</p>"#.to_string(),
            })
            .collect::<String>()
            .into_bytes()
    })
}

// =============================================================================
// THRESHOLD PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn dimension_message_tracks_thresholds(
        width in dimension_strategy(),
        height in dimension_strategy(),
    ) {
        let package = open(builder(EpubVersion::V3).item("img", "a.png", "image/png", png(width, height, 0)));
        let report = CollectingReport::new();
        BitmapChecker::new(&package, &report, "OEBPS/a.png", "image/png").run_checks();

        let oversized = width >= WIDTH_MAX || height >= HEIGHT_MAX;
        prop_assert_eq!(report.count(MessageId::Opf051), usize::from(oversized));
        prop_assert_eq!(report.count(MessageId::Opf057), 0);
    }

    #[test]
    fn truncated_header_never_mismatches(
        media_type in media_type_strategy(),
        data in prop::collection::vec(any::<u8>(), 0..4),
    ) {
        let package = open(builder(EpubVersion::V3).item("img", "a.bin", media_type, data));
        let report = CollectingReport::new();
        BitmapChecker::new(&package, &report, "OEBPS/a.bin", media_type).run_checks();

        prop_assert_eq!(report.count(MessageId::Med004), 1);
        prop_assert_eq!(report.count(MessageId::Opf029), 0);
    }

    #[test]
    fn header_check_only_constrains_known_types(
        header in prop::array::uniform4(any::<u8>()),
    ) {
        prop_assert!(header_matches("image/bmp", &header));
        prop_assert!(header_matches("image/webp", &header));
        prop_assert_eq!(header_matches("image/jpeg", &header), header[0] == 0xFF && header[1] == 0xD8);
        prop_assert_eq!(header_matches("image/gif", &header), &header == b"GIF8");
    }
}

// =============================================================================
// VERDICT PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn validate_passes_iff_counters_unchanged(body in body_strategy()) {
        let body = String::from_utf8(body).unwrap();
        let package = open(builder(EpubVersion::V2).item("c1", "c1.xhtml", "application/xhtml+xml", xhtml(&body)));
        let report = CollectingReport::new();
        let passed = OpsChecker::new(
            &package,
            &report,
            Resource::new("OEBPS/c1.xhtml", "application/xhtml+xml"),
            EpubVersion::V2,
        )
        .validate();

        let quiet = report.fatal_error_count() == 0
            && report.error_count() == 0
            && report.warning_count() == 0;
        prop_assert_eq!(passed, quiet);
    }
}
