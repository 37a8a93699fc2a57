use std::fs;
use std::io::Read;

use epubcheck_ocf::{OcfDirectoryPackage, OcfPackage};
use epubcheck_types::EpubVersion;

fn exploded() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("META-INF")).unwrap();
    fs::create_dir_all(root.join("OEBPS/images")).unwrap();
    fs::write(root.join("mimetype"), "application/epub+zip").unwrap();
    fs::write(
        root.join("META-INF/container.xml"),
        r#"<container><rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#,
    )
    .unwrap();
    fs::write(
        root.join("META-INF/encryption.xml"),
        r#"<encryption xmlns:enc="http://www.w3.org/2001/04/xmlenc#"><enc:EncryptedData><enc:EncryptionMethod Algorithm="urn:custom"/><enc:CipherData><enc:CipherReference URI="OEBPS/locked.xhtml"/></enc:CipherData></enc:EncryptedData></encryption>"#,
    )
    .unwrap();
    fs::write(
        root.join("OEBPS/content.opf"),
        r#"<package version="2.0"><manifest><item id="a" href="images/a.gif" media-type="image/gif"/></manifest></package>"#,
    )
    .unwrap();
    fs::write(root.join("OEBPS/images/a.gif"), b"GIF89a").unwrap();
    fs::write(root.join("OEBPS/locked.xhtml"), b"xx").unwrap();
    dir
}

#[test]
fn reads_entries_from_disk() {
    let dir = exploded();
    let pkg = OcfDirectoryPackage::open(dir.path()).unwrap();
    assert!(pkg.has_entry("OEBPS/images/a.gif"));
    let mut content = Vec::new();
    pkg.input_stream("OEBPS/images/a.gif")
        .unwrap()
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    assert_eq!(content, b"GIF89a");
}

#[test]
fn exploded_path_points_into_the_tree() {
    let dir = exploded();
    let pkg = OcfDirectoryPackage::open(dir.path()).unwrap();
    let path = pkg.exploded_path("OEBPS/images/a.gif").unwrap();
    assert_eq!(path, dir.path().join("OEBPS/images/a.gif"));
    assert!(pkg.exploded_path("OEBPS/none.gif").is_none());
}

#[test]
fn refuses_paths_outside_the_root() {
    let dir = exploded();
    let pkg = OcfDirectoryPackage::open(dir.path().join("OEBPS")).unwrap();
    assert!(!pkg.has_entry("../mimetype"));
    assert!(pkg.input_stream("../mimetype").unwrap().is_none());
    assert!(!pkg.has_entry("/etc/passwd"));
}

#[test]
fn encryption_applies_to_directories_too() {
    let dir = exploded();
    let pkg = OcfDirectoryPackage::open(dir.path()).unwrap();
    assert!(!pkg.can_decrypt("OEBPS/locked.xhtml"));
    assert!(pkg.can_decrypt("OEBPS/images/a.gif"));
}

#[test]
fn lists_nested_entries() {
    let dir = exploded();
    let pkg = OcfDirectoryPackage::open(dir.path()).unwrap();
    let names = pkg.entry_names();
    assert!(names.contains(&"OEBPS/images/a.gif".to_string()));
    assert!(names.contains(&"META-INF/container.xml".to_string()));
}

#[test]
fn parses_package_document() {
    let dir = exploded();
    let pkg = OcfDirectoryPackage::open(dir.path()).unwrap();
    let doc = pkg.package_document().unwrap();
    assert_eq!(doc.version, EpubVersion::V2);
    assert_eq!(doc.items[0].path, "OEBPS/images/a.gif");
}

#[test]
fn file_is_not_a_directory_package() {
    let dir = exploded();
    assert!(OcfDirectoryPackage::open(dir.path().join("mimetype")).is_err());
}
