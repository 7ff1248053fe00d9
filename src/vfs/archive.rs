/*!
 * Archive Store
 * Read-only store over a fully buffered zip container
 */

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::memory::MemoryStore;
use crate::core::limits::prealloc_hint;
use super::traits::BackingStore;
use super::types::*;

/// Read-only view of a zip archive
///
/// The archive is decompressed once at construction into a private entry
/// tree; all reads are served from it. Writes fail with [`VfsError::ReadOnly`].
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    tree: MemoryStore,
    entries: Vec<PathBuf>,
}

impl ArchiveStore {
    /// Parse a zip container from raw bytes
    ///
    /// Entries whose names escape the archive root are skipped. When two
    /// entries share a name the later one wins, including a file and a
    /// directory claiming the same path.
    pub fn from_bytes(bytes: &[u8]) -> VfsResult<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| VfsError::InvalidArchive(e.to_string()))?;

        let tree = MemoryStore::new();
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| VfsError::InvalidArchive(format!("entry {}: {}", i, e)))?;

            let Some(name) = entry.enclosed_name() else {
                warn!(entry = %entry.name(), "Skipping archive entry outside the archive root");
                continue;
            };
            let path = Path::new("/").join(name);

            if entry.is_dir() {
                tree.create_dir_replacing(&path)
                    .map_err(|e| VfsError::InvalidArchive(e.to_string()))?;
            } else {
                let mut data = Vec::with_capacity(prealloc_hint(entry.size()));
                entry
                    .read_to_end(&mut data)
                    .map_err(|e| VfsError::InvalidArchive(format!("{}: {}", path.display(), e)))?;
                tree.insert_replacing(&path, &data)
                    .map_err(|e| VfsError::InvalidArchive(e.to_string()))?;
            }
            entries.push(path);
        }

        debug!(entries = entries.len(), "Parsed archive");
        Ok(Self { tree, entries })
    }

    /// Entry paths in archive order
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}

impl BackingStore for ArchiveStore {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.tree.read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.tree.exists(path)
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        self.tree.metadata(path)
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        self.tree.list_dir(path)
    }

    fn name(&self) -> &str {
        "archive"
    }
}
