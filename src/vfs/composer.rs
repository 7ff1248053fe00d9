/*!
 * VFS Composer
 * Owns one module tree: mounting, archive expansion and finalization
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::factory::BuiltStore;
use super::memory::MemoryStore;
use super::mount::MountTree;
use super::paths;
use super::registry::VfsRegistry;
use super::traits::BackingStore;
use super::types::*;
use crate::core::errors::{LoaderError, LoaderResult};
use crate::core::id::ModuleRoot;
use crate::core::limits::HOST_MOUNT_POINT;
use crate::monitoring::span_stage;
use crate::runtime::HostFilesystem;

/// Composer for one loader's filesystem
///
/// The tree is registered with the registry on construction and is never
/// torn down; `Clone` shares it.
#[derive(Clone)]
pub struct VfsComposer {
    root: ModuleRoot,
    tree: MountTree,
    registry: VfsRegistry,
}

impl VfsComposer {
    /// Create a composer and register its tree under `root`
    pub fn new(root: ModuleRoot, registry: &VfsRegistry) -> Self {
        let tree = MountTree::new();
        registry.register(&root, tree.clone());
        Self {
            root,
            tree,
            registry: registry.clone(),
        }
    }

    pub fn module_root(&self) -> &ModuleRoot {
        &self.root
    }

    /// The module tree, for reading back what was composed
    pub fn tree(&self) -> &MountTree {
        &self.tree
    }

    pub fn mount(&self, path: &Path, store: Arc<dyn BackingStore>) {
        self.tree.mount(path, store);
    }

    pub fn unmount(&self, path: &Path) -> VfsResult<()> {
        self.tree.unmount(path)
    }

    /// Mount a freshly built store, expanding archives into overlays
    pub fn apply(&self, path: &Path, built: BuiltStore) -> VfsResult<()> {
        match built {
            BuiltStore::Archive(archive) => self.expand_archive(path, Arc::new(archive)).map(|_| ()),
            other => {
                self.mount(path, other.into_store());
                Ok(())
            }
        }
    }

    /// Copy a read-only archive into a writable overlay mounted at `target`
    ///
    /// Returns the number of files copied. Scratch mounts are removed even
    /// when the copy fails.
    pub fn expand_archive(&self, target: &Path, archive: Arc<dyn BackingStore>) -> VfsResult<usize> {
        let stage = span_stage("expand_archive");
        let (scratch_archive, scratch_overlay) = paths::scratch_pair();
        let overlay = MemoryStore::new();

        self.tree.mount(&scratch_archive, archive);
        self.tree.mount(&scratch_overlay, Arc::new(overlay.clone()));

        let copied = self.copy_tree(&scratch_archive, &scratch_overlay);

        self.tree.unmount(&scratch_archive)?;
        self.tree.unmount(&scratch_overlay)?;

        let copied = copied.inspect_err(|e| stage.record_error(&e.to_string()))?;
        stage.record_items(copied);
        self.tree.mount(target, Arc::new(overlay));
        info!(
            target = %target.display(),
            files = copied,
            "Expanded archive into writable overlay"
        );
        Ok(copied)
    }

    /// Depth-first copy of `src` into `dst` through the tree
    ///
    /// Directories are created in the destination before their children
    /// are visited. A later write to the same name overwrites an earlier one.
    fn copy_tree(&self, src: &Path, dst: &Path) -> VfsResult<usize> {
        let mut worklist: Vec<PathBuf> = vec![PathBuf::new()];
        let mut copied = 0;

        while let Some(rel) = worklist.pop() {
            let entries = self.tree.list_dir(&src.join(&rel))?;
            for entry in entries.into_iter().rev() {
                let child = rel.join(&entry.name);
                let from = src.join(&child);
                let to = dst.join(&child);

                if entry.is_dir() {
                    self.tree.create_dir(&to)?;
                    worklist.push(child);
                } else {
                    let data = self.tree.read(&from)?;
                    debug!(path = %child.display(), bytes = data.len(), "Copying file");
                    self.tree.write(&to, &data)?;
                    copied += 1;
                }
            }
        }
        Ok(copied)
    }

    /// Bridge the registry into the host filesystem
    ///
    /// Refuses to touch the host while transfers are still pending.
    pub fn finalize(&self, host_fs: &mut dyn HostFilesystem, pending: usize) -> LoaderResult<()> {
        if pending > 0 {
            warn!(pending, "Refusing to finalize with an open batch");
            return Err(LoaderError::BatchOpen(pending));
        }

        let mount_point = Path::new(HOST_MOUNT_POINT);
        let root = self.root.as_path();
        let workdir = mount_point.join(root.strip_prefix("/").unwrap_or(root));

        host_fs.mkdir(mount_point)?;
        host_fs.mount(mount_point, self.registry.as_store())?;
        host_fs.chdir(&workdir)?;

        info!(
            module_root = %self.root,
            workdir = %workdir.display(),
            "Finalized filesystem"
        );
        Ok(())
    }
}
