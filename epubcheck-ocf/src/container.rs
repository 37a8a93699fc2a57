//! `META-INF/container.xml`.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::OcfError;
use crate::paths::attr;

pub const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// One `<rootfile>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rootfile {
    pub full_path: String,
    pub media_type: Option<String>,
}

/// The parsed container document.
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub rootfiles: Vec<Rootfile>,
}

impl Container {
    pub fn parse(bytes: &[u8]) -> Result<Self, OcfError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut rootfiles = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                    let full_path = attr(&e, "full-path").ok_or_else(|| {
                        OcfError::Container("rootfile without full-path".into())
                    })?;
                    rootfiles.push(Rootfile {
                        full_path,
                        media_type: attr(&e, "media-type"),
                    });
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { rootfiles })
    }

    /// The first rootfile declared as a package document, falling back to
    /// the first rootfile of any type.
    pub fn package_rootfile(&self) -> Option<&Rootfile> {
        self.rootfiles
            .iter()
            .find(|r| r.media_type.as_deref() == Some(PACKAGE_MEDIA_TYPE))
            .or_else(|| self.rootfiles.first())
    }
}
