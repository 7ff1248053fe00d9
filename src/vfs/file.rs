/*!
 * File Store
 * A single readable blob bound to one mount path
 */

use std::path::Path;
use std::sync::Arc;

use super::paths;
use super::traits::BackingStore;
use super::types::*;

/// Single-blob store
///
/// Mounted at the entry path, the blob is the store root itself: reading
/// the mount path yields the bytes, and nothing exists beneath it.
#[derive(Debug, Clone)]
pub struct FileStore {
    data: Arc<[u8]>,
}

impl FileStore {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_root(&self, path: &Path) -> VfsResult<()> {
        let path = paths::normalize(path);
        if path == Path::new("/") {
            Ok(())
        } else {
            Err(VfsError::NotFound(path.display().to_string()))
        }
    }
}

impl BackingStore for FileStore {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.check_root(path)?;
        Ok(self.data.to_vec())
    }

    fn exists(&self, path: &Path) -> bool {
        self.check_root(path).is_ok()
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        self.check_root(path)?;
        Ok(Metadata::file(self.data.len() as u64))
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        self.check_root(path)?;
        Err(VfsError::NotADirectory(paths::normalize(path).display().to_string()))
    }

    fn name(&self) -> &str {
        "file"
    }
}
