/*!
 * Loader Configuration
 * JSON-deserializable options with environment overrides
 */

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::mount_spec::MountSpec;
use crate::core::errors::{LoaderError, LoaderResult};
use crate::core::id::ModuleRoot;
use crate::core::limits::{DEFAULT_ORIGIN, DEFAULT_STORAGE_PATH};
use crate::runtime::{HostCapabilities, RuntimeFlags};

/// Overrides the persistent store root
pub const STORAGE_PATH_ENV: &str = "EMLOADER_STORAGE_PATH";

/// Overrides the webroot
pub const WEBROOT_ENV: &str = "EMLOADER_WEBROOT";

/// Loader options
///
/// Every field is independently defaulted, so `{}` is a valid config that
/// starts the runtime with no mounts. The browser-side camelCase names
/// (`useWorker`, `executableArgs`, `mountSpec`, ...) and the older flat
/// names (`executableargs`, `modulepath`, `mnt`) are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Base URL relative locators are resolved against
    pub webroot: Option<String>,

    #[serde(alias = "useWorker")]
    pub use_worker: bool,

    #[serde(alias = "useWebGL")]
    pub use_webgl: bool,

    #[serde(alias = "useSound")]
    pub use_sound: bool,

    pub executable: Option<String>,

    #[serde(alias = "executableArgs", alias = "executableargs")]
    pub executable_args: Vec<String>,

    #[serde(alias = "exportName", alias = "exportname")]
    pub export_name: Option<String>,

    /// Selector of the input surface, handed through to the host
    pub canvas: Option<String>,

    /// Caller-chosen module root; generated when absent
    #[serde(alias = "modulePath", alias = "modulepath")]
    pub module_path: Option<String>,

    /// Mounts to stage; absent means straight to runtime start
    #[serde(alias = "mountSpec", alias = "mnt")]
    pub mount_spec: Option<MountSpec>,

    /// Root directory for persistent stores
    pub storage_root: Option<PathBuf>,

    /// Origin scoping persistent stores; derived from the webroot when absent
    pub origin: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            webroot: None,
            use_worker: false,
            use_webgl: false,
            use_sound: true,
            executable: None,
            executable_args: Vec::new(),
            export_name: None,
            canvas: None,
            module_path: None,
            mount_spec: None,
            storage_root: None,
            origin: None,
        }
    }
}

impl LoaderConfig {
    pub fn from_json(json: &str) -> LoaderResult<Self> {
        serde_json::from_str(json).map_err(|e| LoaderError::InvalidConfig(e.to_string()))
    }

    /// Load a config file and apply environment overrides
    pub fn from_file(path: &Path) -> LoaderResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| LoaderError::InvalidConfig(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&json)?.with_env_overrides();
        info!(path = %path.display(), "Loaded loader config");
        Ok(config)
    }

    /// Apply `EMLOADER_STORAGE_PATH` and `EMLOADER_WEBROOT`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(storage) = std::env::var(STORAGE_PATH_ENV) {
            info!(storage_root = %storage, "Storage root overridden from environment");
            self.storage_root = Some(PathBuf::from(storage));
        }
        if let Ok(webroot) = std::env::var(WEBROOT_ENV) {
            info!(webroot = %webroot, "Webroot overridden from environment");
            self.webroot = Some(webroot);
        }
        self
    }

    /// Parsed webroot, always ending in `/` so relative joins append
    pub fn webroot_url(&self) -> LoaderResult<Option<Url>> {
        let Some(raw) = self.webroot.as_deref() else {
            return Ok(None);
        };
        let raw = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        Url::parse(&raw)
            .map(Some)
            .map_err(|e| LoaderError::InvalidConfig(format!("webroot {raw:?}: {e}")))
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH))
    }

    /// Explicit origin, else the webroot's `host[:port]`, else a fixed default
    pub fn origin(&self) -> String {
        if let Some(origin) = &self.origin {
            return origin.clone();
        }
        self.webroot_url()
            .ok()
            .flatten()
            .and_then(|url| {
                let host = url.host_str()?.to_string();
                Some(match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host,
                })
            })
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
    }

    pub fn module_root(&self) -> LoaderResult<ModuleRoot> {
        match &self.module_path {
            Some(path) => Ok(ModuleRoot::new(path)?),
            None => Ok(ModuleRoot::generate()),
        }
    }

    /// Effective feature flags: an option is on only if the host offers it
    pub fn detect_capabilities(&self, host: HostCapabilities) -> RuntimeFlags {
        let flags = RuntimeFlags {
            worker: self.use_worker && host.worker,
            webgl: self.use_webgl && host.webgl,
            sound: self.use_sound && host.sound,
        };

        for (feature, requested, available) in [
            ("worker", self.use_worker, host.worker),
            ("webgl", self.use_webgl, host.webgl),
            ("sound", self.use_sound, host.sound),
        ] {
            if requested && !available {
                warn!(feature, "Requested feature not offered by host; disabled");
            }
        }
        info!(
            worker = flags.worker,
            webgl = flags.webgl,
            sound = flags.sound,
            "Capabilities detected"
        );
        flags
    }
}
