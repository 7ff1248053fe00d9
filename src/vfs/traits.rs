/*!
 * VFS Traits
 * Core backing store abstraction
 */

use std::path::Path;

use super::types::*;

/// Backing store trait
///
/// Every store can list and read. Write operations are optional and
/// default to [`VfsError::ReadOnly`]; writable stores override them and
/// return `false` from [`readonly`](BackingStore::readonly).
///
/// Paths handed to a store are relative to its own root and written in
/// absolute form (`/` is the store root).
pub trait BackingStore: Send + Sync {
    /// Read entire file contents
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Check if file/directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Get node metadata
    fn metadata(&self, path: &Path) -> VfsResult<Metadata>;

    /// List directory contents
    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>>;

    /// Write entire file contents (create or overwrite)
    fn write(&self, _path: &Path, _data: &[u8]) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    /// Create directory (including parents)
    fn create_dir(&self, _path: &Path) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    /// Get store name/type
    fn name(&self) -> &str;

    /// Check if store is read-only
    fn readonly(&self) -> bool {
        true
    }
}
