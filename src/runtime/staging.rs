/*!
 * Staging Host
 * In-process host runtime that records what a real runtime would do
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::bridge::{HostCapabilities, HostFilesystem, HostRuntime, RuntimeFlags, RuntimeModule};
use crate::core::errors::LoaderResult;
use crate::vfs::{BackingStore, MemoryStore, MountTree, VfsError, VfsResult};

/// Host filesystem backed by a memory root and a mount tree
pub struct StagingFs {
    tree: MountTree,
    cwd: Option<PathBuf>,
}

impl StagingFs {
    fn new() -> Self {
        let tree = MountTree::new();
        tree.mount("/", Arc::new(MemoryStore::new()));
        Self { tree, cwd: None }
    }
}

impl HostFilesystem for StagingFs {
    fn mkdir(&mut self, path: &Path) -> VfsResult<()> {
        self.tree.create_dir(path)
    }

    fn mount(&mut self, path: &Path, store: Arc<dyn BackingStore>) -> VfsResult<()> {
        self.tree.mount(path, store);
        Ok(())
    }

    fn chdir(&mut self, path: &Path) -> VfsResult<()> {
        if !self.tree.metadata(path)?.is_dir() {
            return Err(VfsError::NotADirectory(path.display().to_string()));
        }
        self.cwd = Some(path.to_path_buf());
        Ok(())
    }
}

/// What the guest would have been started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRecord {
    pub executable: Option<String>,
    pub arguments: Vec<String>,
    pub flags: RuntimeFlags,
    pub hooks_run: Vec<&'static str>,
}

/// Reference host used by the CLI and tests
///
/// Runs pre-run hooks exactly like a real runtime would and records the
/// launch instead of executing a guest.
pub struct StagingHost {
    fs: StagingFs,
    env: Option<BTreeMap<String, String>>,
    capabilities: HostCapabilities,
    launched: Option<LaunchRecord>,
}

impl StagingHost {
    pub fn new() -> Self {
        Self::with_capabilities(HostCapabilities::default())
    }

    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        Self {
            fs: StagingFs::new(),
            env: Some(BTreeMap::new()),
            capabilities,
            launched: None,
        }
    }

    /// Host without an environment map
    pub fn without_environment(mut self) -> Self {
        self.env = None;
        self
    }

    /// Working directory, once set
    pub fn cwd(&self) -> Option<&Path> {
        self.fs.cwd.as_deref()
    }

    /// Host view of the filesystem
    pub fn tree(&self) -> &MountTree {
        &self.fs.tree
    }

    pub fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.fs.tree.read(path)
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.as_ref()?.get(key).map(String::as_str)
    }

    pub fn launched(&self) -> Option<&LaunchRecord> {
        self.launched.as_ref()
    }
}

impl Default for StagingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for StagingHost {
    fn filesystem(&mut self) -> &mut dyn HostFilesystem {
        &mut self.fs
    }

    fn environment(&mut self) -> Option<&mut BTreeMap<String, String>> {
        self.env.as_mut()
    }

    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn launch(&mut self, mut module: RuntimeModule) -> LoaderResult<()> {
        let hooks_run: Vec<_> = module.pre_run.iter().map(|h| h.name()).collect();
        module.run_pre_run(self)?;

        info!(
            executable = ?module.executable,
            args = module.arguments.len(),
            cwd = ?self.fs.cwd,
            "Guest launched"
        );
        self.launched = Some(LaunchRecord {
            executable: module.executable,
            arguments: module.arguments,
            flags: module.flags,
            hooks_run,
        });
        Ok(())
    }
}
