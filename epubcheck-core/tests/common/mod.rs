#![allow(dead_code)]

use std::io;
use std::path::Path;

use epubcheck_ocf::{EntryStream, OcfPackage, OcfZipPackage, PackageBuilder};
use epubcheck_types::EpubVersion;

pub const AES: &str = "http://www.w3.org/2001/04/xmlenc#aes256-cbc";
pub const MIB: usize = 1024 * 1024;

pub fn builder(version: EpubVersion) -> PackageBuilder {
    PackageBuilder::new(version).title("Core Fixture")
}

pub fn open(builder: PackageBuilder) -> OcfZipPackage {
    OcfZipPackage::from_bytes("fixture.epub", builder.build().unwrap()).unwrap()
}

/// Container path of a manifest href.
pub fn container_path(href: &str) -> String {
    format!("OEBPS/{href}")
}

/// Signature and IHDR of a PNG, optionally padded to `len` bytes.
pub fn png(width: u32, height: u32, len: usize) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    if data.len() < len {
        data.resize(len, 0);
    }
    data
}

/// A GIF whose logical screen and first frame differ.
pub fn gif(screen: (u16, u16), frame: (u16, u16)) -> Vec<u8> {
    let mut data = b"GIF89a".to_vec();
    data.extend_from_slice(&screen.0.to_le_bytes());
    data.extend_from_slice(&screen.1.to_le_bytes());
    data.extend_from_slice(&[0, 0, 0]);
    data.push(0x2C);
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(&frame.0.to_le_bytes());
    data.extend_from_slice(&frame.1.to_le_bytes());
    data.extend_from_slice(&[0, 0x3B]);
    data
}

pub fn xhtml(body: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>Fixture</title></head>
  <body>
{body}
  </body>
</html>
"#
    )
    .into_bytes()
}

/// A package that lists every entry but cannot read any of them.
pub struct UnreadablePackage;

impl OcfPackage for UnreadablePackage {
    fn name(&self) -> &str {
        "unreadable.epub"
    }

    fn package_path(&self) -> &Path {
        Path::new("unreadable.epub")
    }

    fn has_entry(&self, _path: &str) -> bool {
        true
    }

    fn can_decrypt(&self, _path: &str) -> bool {
        true
    }

    fn input_stream(&self, _path: &str) -> io::Result<Option<EntryStream<'_>>> {
        Err(io::Error::other("device not ready"))
    }

    fn entry_names(&self) -> Vec<String> {
        Vec::new()
    }
}
