//! `META-INF/encryption.xml`.
//!
//! Only the mapping from entry path to encryption algorithm is kept. Font
//! obfuscation is reversible without a key, every other algorithm is not.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::OcfError;
use crate::paths::{attr, resolve};

/// Algorithms that obfuscate rather than encrypt.
pub const OBFUSCATION_ALGORITHMS: [&str; 2] = [
    "http://www.idpf.org/2008/embedding",
    "http://ns.adobe.com/pdf/enc#RC",
];

#[derive(Debug, Clone, Default)]
pub struct EncryptionInfo {
    algorithms: HashMap<String, String>,
}

impl EncryptionInfo {
    pub fn parse(bytes: &[u8]) -> Result<Self, OcfError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut algorithms = HashMap::new();
        let mut current_algorithm: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"EncryptedData" => current_algorithm = None,
                    b"EncryptionMethod" => current_algorithm = attr(&e, "Algorithm"),
                    b"CipherReference" => {
                        // URIs are relative to the container root.
                        if let Some(path) = attr(&e, "URI").and_then(|u| resolve("", &u)) {
                            algorithms
                                .insert(path, current_algorithm.clone().unwrap_or_default());
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { algorithms })
    }

    pub fn is_encrypted(&self, path: &str) -> bool {
        self.algorithms.contains_key(path)
    }

    pub fn algorithm(&self, path: &str) -> Option<&str> {
        self.algorithms.get(path).map(String::as_str)
    }

    pub fn can_decrypt(&self, path: &str) -> bool {
        match self.algorithms.get(path) {
            None => true,
            Some(algorithm) => OBFUSCATION_ALGORITHMS.contains(&algorithm.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}
