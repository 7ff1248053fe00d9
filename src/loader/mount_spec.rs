/*!
 * Mount Specification
 * Declarative path -> [kind, source?] map, parsed into ordered entries
 */

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

use crate::core::errors::{LoaderError, LoaderResult};
use crate::vfs::paths::normalize_mount_path;
use crate::vfs::MountKind;

/// One declared mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub path: PathBuf,
    pub kind: MountKind,
    pub source: Option<String>,
}

/// Parsed mount specification
///
/// Entries are held in lexicographic path order, so an ancestor always
/// precedes its descendants. Duplicate paths after normalization (e.g.
/// `/drivec` and `/drivec/`) keep the last declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountSpec {
    entries: Vec<MountEntry>,
}

impl MountSpec {
    /// Parse a JSON object mapping path to `[kind, source?]`
    pub fn from_json(json: &str) -> LoaderResult<Self> {
        let raw: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(|e| LoaderError::InvalidSpec(e.to_string()))?;
        Self::from_map(raw)
    }

    /// Build from already-decoded pairs
    ///
    /// Fails on the first unknown kind, before anything is fetched.
    pub fn from_map(raw: BTreeMap<String, Vec<String>>) -> LoaderResult<Self> {
        let mut by_path: BTreeMap<PathBuf, MountEntry> = BTreeMap::new();

        for (raw_path, parts) in raw {
            let mut parts = parts.into_iter();
            let kind = parts
                .next()
                .ok_or_else(|| LoaderError::InvalidSpec(format!("{raw_path}: missing kind")))?
                .parse::<MountKind>()?;
            let mut source = parts.next().filter(|s| !s.is_empty());
            if parts.next().is_some() {
                return Err(LoaderError::InvalidSpec(format!(
                    "{raw_path}: expected [kind, source?]"
                )));
            }

            let path = normalize_mount_path(&raw_path)?;
            if kind.needs_bytes() && source.is_none() {
                return Err(LoaderError::MissingSource(path.display().to_string()));
            }
            if !kind.needs_bytes() && source.is_some() {
                warn!(path = %path.display(), kind = %kind, "Ignoring source of local mount");
                source = None;
            }

            by_path.insert(path.clone(), MountEntry { path, kind, source });
        }

        Ok(Self {
            entries: by_path.into_values().collect(),
        })
    }

    pub fn entries(&self) -> &[MountEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that need a transfer
    pub fn fetch_count(&self) -> usize {
        self.entries.iter().filter(|e| e.source.is_some()).count()
    }
}

impl Serialize for MountSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<String, Vec<String>> = self
            .entries
            .iter()
            .map(|e| {
                let mut parts = vec![e.kind.to_string()];
                parts.extend(e.source.clone());
                (e.path.display().to_string(), parts)
            })
            .collect();
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MountSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Vec<String>>::deserialize(deserializer)?;
        Self::from_map(raw).map_err(serde::de::Error::custom)
    }
}
