//! OCF container access.
//!
//! An EPUB publication ships as an OCF container: a zip archive (or, during
//! authoring, an exploded directory) holding
//! - `mimetype`                — `application/epub+zip`, stored first
//! - `META-INF/container.xml`  — points at the package document(s)
//! - `META-INF/encryption.xml` — optional list of encrypted entries
//! - the package document (`*.opf`) and every resource its manifest lists
//!
//! [`OcfPackage`] is the read-only view the checkers consume. Two
//! implementations are provided: [`OcfZipPackage`] and
//! [`OcfDirectoryPackage`]. [`PackageBuilder`] assembles small zip
//! containers in memory, mostly for tests.

mod builder;
mod container;
mod directory;
mod encryption;
mod error;
mod package_document;
mod paths;
mod zip_package;

pub use builder::PackageBuilder;
pub use container::{Container, Rootfile};
pub use directory::OcfDirectoryPackage;
pub use encryption::{EncryptionInfo, OBFUSCATION_ALGORITHMS};
pub use error::OcfError;
pub use package_document::{ManifestItem, PackageDocument, PackageMetadata};
pub use zip_package::OcfZipPackage;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub const MIMETYPE_ENTRY: &str = "mimetype";
pub const CONTAINER_ENTRY: &str = "META-INF/container.xml";
pub const ENCRYPTION_ENTRY: &str = "META-INF/encryption.xml";
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// A stream over one container entry. Dropping it releases the entry.
pub type EntryStream<'a> = Box<dyn Read + Send + 'a>;

/// Read-only access to the entries of an OCF container.
///
/// Paths are container-relative, `/`-separated, without a leading slash
/// (`OEBPS/images/cover.png`). Implementations are shared between
/// concurrently running resource checks and must be `Send + Sync`.
pub trait OcfPackage: Send + Sync {
    /// Display name used in message locations (usually the file name).
    fn name(&self) -> &str;

    /// Filesystem location of the container.
    fn package_path(&self) -> &Path;

    fn has_entry(&self, path: &str) -> bool;

    /// False when the entry is encrypted with an algorithm the checker
    /// cannot reverse. Unencrypted and font-obfuscated entries are
    /// decryptable.
    fn can_decrypt(&self, path: &str) -> bool;

    /// Opens an entry. `Ok(None)` means the entry does not exist.
    fn input_stream(&self, path: &str) -> io::Result<Option<EntryStream<'_>>>;

    /// All entry names, sorted.
    fn entry_names(&self) -> Vec<String>;

    /// For containers backed by a directory, the file holding `path`.
    /// Lets callers use the file in place instead of copying it out.
    fn exploded_path(&self, path: &str) -> Option<PathBuf> {
        let _ = path;
        None
    }

    /// Reads a whole entry into memory.
    fn read_entry(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match self.input_stream(path)? {
            Some(mut stream) => {
                let mut data = Vec::new();
                stream.read_to_end(&mut data)?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Parses `META-INF/container.xml`.
    fn container(&self) -> Result<Container, OcfError> {
        let bytes = self
            .read_entry(CONTAINER_ENTRY)?
            .ok_or_else(|| OcfError::MissingEntry(CONTAINER_ENTRY.into()))?;
        Container::parse(&bytes)
    }

    /// Locates and parses the primary package document.
    fn package_document(&self) -> Result<PackageDocument, OcfError> {
        let container = self.container()?;
        let rootfile = container.package_rootfile().ok_or_else(|| {
            OcfError::Container("no rootfile for the package document".into())
        })?;
        let bytes = self
            .read_entry(&rootfile.full_path)?
            .ok_or_else(|| OcfError::MissingEntry(rootfile.full_path.clone()))?;
        PackageDocument::parse(&rootfile.full_path, &bytes)
    }
}
