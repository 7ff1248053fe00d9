/*!
 * Directory Operations Implementation
 * Directory creation and listing for the memory store
 */

use std::path::{Path, PathBuf};

use super::super::paths;
use super::super::types::*;
use super::node::Node;
use super::MemoryStore;

impl MemoryStore {
    pub(super) fn list_dir_impl(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        let path = paths::normalize(path);

        match self.nodes.get(&path).map(|n| n.clone()) {
            Some(Node::Directory { children }) => {
                let mut entries = Vec::with_capacity(children.len());
                for (name, child_path) in children {
                    if let Some(node) = self.nodes.get(&child_path) {
                        entries.push(Entry::new_unchecked(name, node.file_type()));
                    }
                }
                Ok(entries)
            }
            Some(Node::File { .. }) => Err(VfsError::NotADirectory(path.display().to_string())),
            None => Err(VfsError::NotFound(path.display().to_string())),
        }
    }

    /// Create a directory and any missing ancestors; existing directories are fine
    pub(super) fn create_dir_impl(&self, path: &Path) -> VfsResult<()> {
        let path = paths::normalize(path);

        let mut current = PathBuf::from("/");
        for component in path.components().skip(1) {
            let parent = current.clone();
            current.push(component);

            match self.nodes.get(&current).map(|n| n.is_dir()) {
                Some(true) => continue,
                Some(false) => {
                    return Err(VfsError::NotADirectory(current.display().to_string()));
                }
                None => {}
            }

            let name = self.file_name(&current)?;
            self.nodes.insert(current.clone(), Node::empty_dir());
            self.add_child(&parent, &name, &current)?;
        }

        Ok(())
    }

    /// Remove a node and everything below it, unlinking it from its parent
    pub(super) fn remove_subtree(&self, path: &Path) -> VfsResult<()> {
        let path = paths::normalize(path);
        if path == Path::new("/") {
            return Err(VfsError::PermissionDenied("cannot remove root".into()));
        }

        if let Some(parent) = path.parent() {
            let name = self.file_name(&path)?;
            if let Some(mut node) = self.nodes.get_mut(parent) {
                if let Node::Directory { children } = node.value_mut() {
                    children.remove(&name);
                }
            }
        }

        let mut worklist = vec![path];
        while let Some(current) = worklist.pop() {
            if let Some((_, Node::Directory { children })) = self.nodes.remove(&current) {
                worklist.extend(children.into_values());
            }
        }
        Ok(())
    }
}
