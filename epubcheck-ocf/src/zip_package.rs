//! Zip-backed containers.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::{ENCRYPTION_ENTRY, EncryptionInfo, EntryStream, OcfError, OcfPackage};

/// An OCF zip container with all entries loaded at open time.
pub struct OcfZipPackage {
    name: String,
    path: PathBuf,
    entries: BTreeMap<String, Vec<u8>>,
    encryption: EncryptionInfo,
}

impl OcfZipPackage {
    /// Opens a container file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OcfError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_reader(name, path.to_path_buf(), file)
    }

    /// Reads a container from any seekable source. `name` is what message
    /// locations will show for container-level problems.
    pub fn from_reader<R: Read + Seek>(
        name: impl Into<String>,
        path: PathBuf,
        reader: R,
    ) -> Result<Self, OcfError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let entry_name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.insert(entry_name, data);
        }

        let encryption = match entries.get(ENCRYPTION_ENTRY) {
            Some(bytes) => EncryptionInfo::parse(bytes).unwrap_or_else(|e| {
                warn!(error = %e, "unreadable encryption.xml, treating entries as plain");
                EncryptionInfo::default()
            }),
            None => EncryptionInfo::default(),
        };

        let name = name.into();
        debug!(package = %name, entries = entries.len(), "zip container opened");
        Ok(Self {
            name,
            path,
            entries,
            encryption,
        })
    }

    /// Reads a container held in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, OcfError> {
        let name = name.into();
        let path = PathBuf::from(&name);
        Self::from_reader(name, path, Cursor::new(bytes))
    }

    pub fn encryption(&self) -> &EncryptionInfo {
        &self.encryption
    }
}

impl OcfPackage for OcfZipPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn package_path(&self) -> &Path {
        &self.path
    }

    fn has_entry(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    fn can_decrypt(&self, path: &str) -> bool {
        self.encryption.can_decrypt(path)
    }

    fn input_stream(&self, path: &str) -> io::Result<Option<EntryStream<'_>>> {
        Ok(self
            .entries
            .get(path)
            .map(|data| Box::new(data.as_slice()) as EntryStream<'_>))
    }

    fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
