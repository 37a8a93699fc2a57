use epubcheck_types::{Message, MessageId, MessageLocation, Severity};
use pretty_assertions::assert_eq;

// ── Catalog ──────────────────────────────────────────────────────

#[test]
fn codes_are_unique() {
    let mut codes: Vec<&str> = MessageId::ALL.iter().map(|id| id.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), MessageId::ALL.len());
}

#[test]
fn gate_failures_are_errors() {
    assert_eq!(MessageId::Rsc001.severity(), Severity::Error);
    assert_eq!(MessageId::Rsc004.severity(), Severity::Error);
}

#[test]
fn image_threshold_messages_are_warnings() {
    assert_eq!(MessageId::Opf029.severity(), Severity::Warning);
    assert_eq!(MessageId::Opf051.severity(), Severity::Warning);
    assert_eq!(MessageId::Opf057.severity(), Severity::Warning);
}

#[test]
fn malformed_markup_is_fatal() {
    assert_eq!(MessageId::Rsc016.severity(), Severity::Fatal);
}

#[test]
fn format_fills_positional_arguments() {
    let text = MessageId::Opf029.format(&["img/a.jpg".into(), "image/jpeg".into()]);
    assert_eq!(
        text,
        "The file 'img/a.jpg' does not appear to match the media type image/jpeg, as specified in the OPF file."
    );
}

#[test]
fn format_leaves_missing_placeholders() {
    let text = MessageId::Opf029.format(&["img/a.jpg".into()]);
    assert!(text.contains("{1}"));
}

#[test]
fn format_does_not_expand_placeholders_inside_arguments() {
    let text = MessageId::Opf029.format(&["OEBPS/a{1}.png".into(), "image/png".into()]);
    assert_eq!(
        text,
        "The file 'OEBPS/a{1}.png' does not appear to match the media type image/png, as specified in the OPF file."
    );
}

#[test]
fn format_keeps_literal_braces_in_arguments() {
    let text = MessageId::Rsc001.format(&["{0}/{x}{".into()]);
    assert!(text.contains("{0}/{x}{"), "{text}");
}

// ── Messages ─────────────────────────────────────────────────────

#[test]
fn message_takes_catalog_severity() {
    let msg = Message::new(
        MessageId::Med004,
        MessageLocation::new("img/a.png", 0, 0),
        vec![],
    );
    assert_eq!(msg.severity, Severity::Error);
    assert_eq!(msg.text(), "Image file header may be corrupted.");
}

#[test]
fn display_includes_code_location_and_text() {
    let msg = Message::new(
        MessageId::Rsc001,
        MessageLocation::unknown("book.epub"),
        vec!["OEBPS/missing.xhtml".into()],
    );
    assert_eq!(
        msg.to_string(),
        "ERROR(RSC-001): book.epub: File 'OEBPS/missing.xhtml' could not be found."
    );
}

#[test]
fn serializes_with_catalog_codes() {
    let msg = Message::new(
        MessageId::Opf051,
        MessageLocation::unknown("img/big.png"),
        vec![],
    );
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["id"], "OPF-051");
    assert_eq!(json["severity"], "WARNING");
    assert!(json["location"].get("context").is_none());
}
