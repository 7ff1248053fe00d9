/*!
 * File Operations Implementation
 * Byte-level reads and writes for the memory store
 */

use std::path::Path;

use super::super::paths;
use super::super::types::*;
use super::node::Node;
use super::MemoryStore;

impl MemoryStore {
    pub(super) fn read_impl(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let path = paths::normalize(path);

        match self.nodes.get(&path).map(|n| n.clone()) {
            Some(Node::File { data }) => Ok(data),
            Some(Node::Directory { .. }) => Err(VfsError::IsADirectory(path.display().to_string())),
            None => Err(VfsError::NotFound(path.display().to_string())),
        }
    }

    /// Create or overwrite a file; the parent directory must already exist
    pub(super) fn write_impl(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let path = paths::normalize(path);
        if path == Path::new("/") {
            return Err(VfsError::IsADirectory("/".into()));
        }
        self.ensure_parent(&path)?;

        let existed = match self.nodes.get(&path).map(|n| n.is_dir()) {
            Some(true) => return Err(VfsError::IsADirectory(path.display().to_string())),
            Some(false) => true,
            None => false,
        };

        if !existed {
            if let Some(parent) = path.parent() {
                let file_name = self.file_name(&path)?;
                self.add_child(parent, &file_name, &path)?;
            }
        }

        self.nodes.insert(
            path,
            Node::File {
                data: data.to_vec(),
            },
        );
        Ok(())
    }
}
