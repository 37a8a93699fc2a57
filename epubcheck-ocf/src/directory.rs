//! Exploded (unzipped) containers.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::{ENCRYPTION_ENTRY, EncryptionInfo, EntryStream, OcfError, OcfPackage};

/// A container unpacked into a directory tree.
pub struct OcfDirectoryPackage {
    name: String,
    root: PathBuf,
    encryption: EncryptionInfo,
}

impl OcfDirectoryPackage {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, OcfError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(OcfError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            )));
        }
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        let encryption_file = root.join(ENCRYPTION_ENTRY);
        let encryption = if encryption_file.is_file() {
            let bytes = fs::read(&encryption_file)?;
            EncryptionInfo::parse(&bytes).unwrap_or_else(|e| {
                warn!(error = %e, "unreadable encryption.xml, treating entries as plain");
                EncryptionInfo::default()
            })
        } else {
            EncryptionInfo::default()
        };

        Ok(Self {
            name,
            root,
            encryption,
        })
    }

    /// Maps a container path to a file under the root, refusing anything
    /// that could leave it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl OcfPackage for OcfDirectoryPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn package_path(&self) -> &Path {
        &self.root
    }

    fn has_entry(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.is_file())
    }

    fn can_decrypt(&self, path: &str) -> bool {
        self.encryption.can_decrypt(path)
    }

    fn input_stream(&self, path: &str) -> io::Result<Option<EntryStream<'_>>> {
        let Some(file_path) = self.resolve(path) else {
            return Ok(None);
        };
        match File::open(file_path) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn entry_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_files(&self.root, "", &mut names);
        names.sort();
        names
    }

    fn exploded_path(&self, path: &str) -> Option<PathBuf> {
        self.resolve(path).filter(|p| p.is_file())
    }
}

fn collect_files(dir: &Path, prefix: &str, names: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let name = format!("{prefix}{file_name}");
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, &format!("{name}/"), names);
        } else {
            names.push(name);
        }
    }
}
