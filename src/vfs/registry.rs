/*!
 * VFS Registry
 * Process-wide mount table shared by every loader instance
 */

use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::info;

use super::mount::MountTree;
use super::traits::BackingStore;
use super::types::VfsResult;
use crate::core::id::ModuleRoot;

static GLOBAL_REGISTRY: OnceLock<VfsRegistry> = OnceLock::new();

/// Shared registry of module trees
///
/// Each loader registers its own [`MountTree`] under a distinct
/// [`ModuleRoot`]; separate logical filesystems exist only through that
/// namespacing. The global instance is created on first use and never torn
/// down. Independent instances can be created for isolation in tests.
#[derive(Clone, Default)]
pub struct VfsRegistry {
    tree: MountTree,
}

impl VfsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static VfsRegistry {
        GLOBAL_REGISTRY.get_or_init(|| {
            info!("Initializing process-wide VFS registry");
            VfsRegistry::new()
        })
    }

    /// Register a module tree under its root
    pub fn register(&self, root: &ModuleRoot, tree: MountTree) {
        info!(module_root = %root, "Registering module tree");
        self.tree.mount(root.as_path(), Arc::new(tree));
    }

    /// Check if a module root is registered
    pub fn is_registered(&self, root: &ModuleRoot) -> bool {
        self.tree.is_mounted(root.as_path())
    }

    /// Read a file through the registry (`/<module-root>/...`)
    pub fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.tree.read(path)
    }

    /// The registry as a store, for bridging into a host filesystem
    pub fn as_store(&self) -> Arc<dyn BackingStore> {
        Arc::new(self.tree.clone())
    }
}
