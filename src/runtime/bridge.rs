/*!
 * Runtime Bridge
 * Contract between the loader and the sandboxed host runtime
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::core::errors::LoaderResult;
use crate::vfs::{BackingStore, VfsResult};

/// The host runtime's own filesystem abstraction
pub trait HostFilesystem: Send {
    /// Create a directory (existing directories are accepted)
    fn mkdir(&mut self, path: &Path) -> VfsResult<()>;

    /// Mount an external store at `path`
    fn mount(&mut self, path: &Path, store: Arc<dyn BackingStore>) -> VfsResult<()>;

    /// Set the working directory
    fn chdir(&mut self, path: &Path) -> VfsResult<()>;
}

/// What the host runtime can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    pub worker: bool,
    pub webgl: bool,
    pub sound: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            worker: true,
            webgl: true,
            sound: true,
        }
    }
}

/// Externally owned runtime that executes the guest program
///
/// `launch` must run every pre-run hook of the module, in list order,
/// before any guest instruction executes, and must stop at the first
/// failing hook.
pub trait HostRuntime: Send {
    fn filesystem(&mut self) -> &mut dyn HostFilesystem;

    /// Process environment, when the host exposes one
    fn environment(&mut self) -> Option<&mut BTreeMap<String, String>>;

    fn capabilities(&self) -> HostCapabilities;

    fn launch(&mut self, module: RuntimeModule) -> LoaderResult<()>;
}

type HookFn = Box<dyn FnOnce(&mut dyn HostRuntime) -> LoaderResult<()> + Send>;

/// One step run by the host before the guest starts
pub struct PreRunHook {
    name: &'static str,
    run: HookFn,
}

impl PreRunHook {
    pub fn new<F>(name: &'static str, run: F) -> Self
    where
        F: FnOnce(&mut dyn HostRuntime) -> LoaderResult<()> + Send + 'static,
    {
        Self {
            name,
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run(self, host: &mut dyn HostRuntime) -> LoaderResult<()> {
        (self.run)(host)
    }
}

impl fmt::Debug for PreRunHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreRunHook").field("name", &self.name).finish()
    }
}

/// Effective feature flags after capability detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeFlags {
    pub worker: bool,
    pub webgl: bool,
    pub sound: bool,
}

/// Everything the host needs to start the guest
#[derive(Debug, Default)]
pub struct RuntimeModule {
    pub executable: Option<String>,
    pub arguments: Vec<String>,
    pub export_name: Option<String>,
    pub canvas: Option<String>,
    pub flags: RuntimeFlags,
    pub pre_run: Vec<PreRunHook>,
}

impl RuntimeModule {
    /// Run and consume every pre-run hook in order
    pub fn run_pre_run(&mut self, host: &mut dyn HostRuntime) -> LoaderResult<()> {
        for hook in std::mem::take(&mut self.pre_run) {
            tracing::debug!(hook = hook.name(), "Running pre-run hook");
            hook.run(host)?;
        }
        Ok(())
    }
}
