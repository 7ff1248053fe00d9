/*!
 * Backing Store Factory
 * Builds stores from a mount kind and (optionally) fetched bytes
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::archive::ArchiveStore;
use super::file::FileStore;
use super::persistent::PersistentStore;
use super::traits::BackingStore;
use crate::core::errors::{LoaderError, LoaderResult};

/// Kind tag of a mount entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MountKind {
    File,
    Archive,
    PersistentLocal,
}

impl MountKind {
    /// Whether this kind is materialized from fetched bytes
    #[inline]
    pub const fn needs_bytes(self) -> bool {
        matches!(self, MountKind::File | MountKind::Archive)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MountKind::File => "file",
            MountKind::Archive => "archive",
            MountKind::PersistentLocal => "persistent-local",
        }
    }
}

impl FromStr for MountKind {
    type Err = LoaderError;

    /// Accepts the canonical tags plus the legacy `zip` and `localstorage` aliases
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "file" => Ok(MountKind::File),
            "archive" | "zip" => Ok(MountKind::Archive),
            "persistent-local" | "localstorage" => Ok(MountKind::PersistentLocal),
            other => Err(LoaderError::UnsupportedKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for MountKind {
    type Error = LoaderError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

impl From<MountKind> for String {
    fn from(kind: MountKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly built store, still tagged with its variant
///
/// Archives need expansion before they can be mounted as a working mount
/// point; the other variants mount as-is.
#[derive(Debug, Clone)]
pub enum BuiltStore {
    File(FileStore),
    Archive(ArchiveStore),
    Persistent(PersistentStore),
}

impl BuiltStore {
    pub fn into_store(self) -> Arc<dyn BackingStore> {
        match self {
            BuiltStore::File(store) => Arc::new(store),
            BuiltStore::Archive(store) => Arc::new(store),
            BuiltStore::Persistent(store) => Arc::new(store),
        }
    }
}

/// Factory for backing stores
///
/// Holds the settings persistent stores need; everything else comes from
/// the mount entry.
#[derive(Debug, Clone)]
pub struct StoreFactory {
    storage_root: PathBuf,
    origin: String,
}

impl StoreFactory {
    pub fn new(storage_root: impl Into<PathBuf>, origin: impl Into<String>) -> Self {
        Self {
            storage_root: storage_root.into(),
            origin: origin.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Build the store for one mount entry
    pub fn create(&self, kind: MountKind, path: &Path, bytes: Option<&[u8]>) -> LoaderResult<BuiltStore> {
        match kind {
            MountKind::File => {
                let bytes = bytes.ok_or_else(|| Self::missing(path))?;
                Ok(BuiltStore::File(FileStore::new(bytes)))
            }
            MountKind::Archive => {
                let bytes = bytes.ok_or_else(|| Self::missing(path))?;
                let store = ArchiveStore::from_bytes(bytes).map_err(|e| LoaderError::ArchiveParse {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                Ok(BuiltStore::Archive(store))
            }
            MountKind::PersistentLocal => {
                let store = PersistentStore::open(&self.storage_root, &self.origin, path)?;
                Ok(BuiltStore::Persistent(store))
            }
        }
    }

    fn missing(path: &Path) -> LoaderError {
        LoaderError::MissingSource(path.display().to_string())
    }
}
