/*!
 * In-Memory Store
 * Writable, volatile store used as the overlay for expanded archives
 */

mod dir_ops;
mod file_ops;
mod node;

use ahash::RandomState;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::paths;
use super::traits::BackingStore;
use super::types::*;
use node::Node;

/// In-memory store implementation
///
/// `Clone` shares the underlying node table, so a clone mounted elsewhere
/// sees every write made through the original.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub(super) nodes: Arc<DashMap<PathBuf, Node, RandomState>>,
}

impl MemoryStore {
    /// Create new in-memory store holding only the root directory
    pub fn new() -> Self {
        let nodes = DashMap::with_hasher(RandomState::new());
        nodes.insert(PathBuf::from("/"), Node::empty_dir());

        Self {
            nodes: Arc::new(nodes),
        }
    }

    /// Insert a file, creating parent directories as needed
    pub fn insert(&self, path: impl AsRef<Path>, data: &[u8]) -> VfsResult<()> {
        let path = paths::normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.create_dir_impl(parent)?;
        }
        self.write_impl(&path, data)
    }

    /// Insert a file where the newest entry wins
    ///
    /// A file standing where a directory is needed, or a directory standing
    /// where the file goes, is removed first.
    pub fn insert_replacing(&self, path: impl AsRef<Path>, data: &[u8]) -> VfsResult<()> {
        let path = paths::normalize(path.as_ref());
        self.clear_conflicts(&path, false)?;
        self.insert(&path, data)
    }

    /// Create a directory where the newest entry wins
    pub fn create_dir_replacing(&self, path: impl AsRef<Path>) -> VfsResult<()> {
        let path = paths::normalize(path.as_ref());
        self.clear_conflicts(&path, true)?;
        self.create_dir_impl(&path)
    }

    fn clear_conflicts(&self, path: &Path, want_dir: bool) -> VfsResult<()> {
        let blocking = path
            .ancestors()
            .skip(1)
            .filter(|a| *a != Path::new("/"))
            .find(|a| self.nodes.get(*a).is_some_and(|n| !n.is_dir()))
            .map(Path::to_path_buf);
        if let Some(file) = blocking {
            return self.remove_subtree(&file);
        }

        let clashes = self.nodes.get(path).is_some_and(|n| n.is_dir() != want_dir);
        if clashes {
            self.remove_subtree(path)?;
        }
        Ok(())
    }

    /// Number of files and directories, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get file name from path
    pub(super) fn file_name(&self, path: &Path) -> VfsResult<String> {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| VfsError::InvalidPath(format!("invalid path: {}", path.display())))
    }

    /// Ensure parent directory exists
    pub(super) fn ensure_parent(&self, path: &Path) -> VfsResult<()> {
        if let Some(parent) = path.parent() {
            match self.nodes.get(parent).map(|n| n.is_dir()) {
                Some(true) => {}
                Some(false) => {
                    return Err(VfsError::NotADirectory(parent.display().to_string()));
                }
                None => {
                    return Err(VfsError::NotFound(format!(
                        "parent directory not found: {}",
                        parent.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Add child to parent directory
    pub(super) fn add_child(
        &self,
        parent_path: &Path,
        child_name: &str,
        child_path: &Path,
    ) -> VfsResult<()> {
        match self.nodes.get_mut(parent_path) {
            Some(mut node) => match node.value_mut() {
                Node::Directory { children } => {
                    children.insert(child_name.to_string(), child_path.to_path_buf());
                    Ok(())
                }
                Node::File { .. } => {
                    Err(VfsError::NotADirectory(parent_path.display().to_string()))
                }
            },
            None => Err(VfsError::NotFound(parent_path.display().to_string())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingStore for MemoryStore {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.read_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.nodes.contains_key(&paths::normalize(path))
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        let path = paths::normalize(path);
        self.nodes
            .get(&path)
            .map(|node| node.metadata())
            .ok_or_else(|| VfsError::NotFound(path.display().to_string()))
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        self.list_dir_impl(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        self.write_impl(path, data)
    }

    fn create_dir(&self, path: &Path) -> VfsResult<()> {
        self.create_dir_impl(path)
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn readonly(&self) -> bool {
        false
    }
}
