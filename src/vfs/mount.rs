/*!
 * Mount Tree
 * Routes paths to backing stores with last-mount-wins overlap resolution
 */

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::paths::{self, relative_to};
use super::traits::BackingStore;
use super::types::*;

/// One registration of a store at a path
#[derive(Clone)]
struct Mount {
    path: PathBuf,
    store: Arc<dyn BackingStore>,
}

/// Layered mount table
///
/// Registrations are kept in mount order. A path resolves to the most
/// recently mounted store whose mount path is the path itself or one of its
/// ancestors, so a later mount wins over everything it overlaps: an
/// earlier mount at an ancestor, at the same path, or nested beneath it.
/// Unmounting a registration uncovers whatever it was hiding.
///
/// Directories that only exist because something is mounted beneath them
/// are synthesized on listing and metadata lookups.
///
/// `Clone` is cheap and shares the table.
#[derive(Clone, Default)]
pub struct MountTree {
    mounts: Arc<RwLock<Vec<Mount>>>,
}

impl MountTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a store at the given path
    ///
    /// A registration at exactly the same path is replaced; overlapping
    /// registrations are shadowed for the overlapping subtree.
    pub fn mount<P: AsRef<Path>>(&self, mount_path: P, store: Arc<dyn BackingStore>) {
        let path = paths::normalize(mount_path.as_ref());
        let mut mounts = self.mounts.write();

        let replaced = mounts.iter().any(|m| m.path == path);
        mounts.retain(|m| m.path != path);
        let shadowed = mounts.iter().filter(|m| m.path.starts_with(&path)).count();

        debug!(
            path = %path.display(),
            store = store.name(),
            replaced,
            shadowed,
            "Mounted store"
        );
        mounts.push(Mount { path, store });
    }

    /// Unmount the store registered at exactly this path
    pub fn unmount<P: AsRef<Path>>(&self, mount_path: P) -> VfsResult<()> {
        let path = paths::normalize(mount_path.as_ref());
        let mut mounts = self.mounts.write();

        match mounts.iter().rposition(|m| m.path == path) {
            Some(index) => {
                mounts.remove(index);
                debug!(path = %path.display(), "Unmounted store");
                Ok(())
            }
            None => Err(VfsError::NotFound(format!(
                "mount point not found: {}",
                path.display()
            ))),
        }
    }

    /// Check if a store is registered at exactly this path
    pub fn is_mounted<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = paths::normalize(path.as_ref());
        self.mounts.read().iter().any(|m| m.path == path)
    }

    /// List visible mount points with their store names, in mount order
    pub fn list_mounts(&self) -> Vec<(PathBuf, String)> {
        let mounts = self.mounts.read();
        visible(&mounts)
            .map(|(_, m)| (m.path.clone(), m.store.name().to_string()))
            .collect()
    }

    /// Resolve path to (registration index, store, store-relative path)
    fn resolve(&self, path: &Path) -> Option<(usize, Arc<dyn BackingStore>, PathBuf)> {
        let mounts = self.mounts.read();
        mounts.iter().enumerate().rev().find_map(|(index, m)| {
            relative_to(path, &m.path).map(|rel| (index, m.store.clone(), rel))
        })
    }

    /// Immediate children of `dir` that exist only through mounts newer
    /// than the store `dir` itself resolves to
    fn mounted_children(&self, dir: &Path, resolved: Option<usize>) -> BTreeMap<String, FileType> {
        let mounts = self.mounts.read();
        let mut children = BTreeMap::new();

        for (index, m) in visible(&mounts) {
            if resolved.is_some_and(|r| index < r) {
                continue;
            }
            let Some(rel) = relative_to(&m.path, dir) else {
                continue;
            };
            let Some(first) = rel.components().nth(1) else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let file_type = if rel.components().count() == 2 {
                m.store
                    .metadata(Path::new("/"))
                    .map(|md| md.file_type)
                    .unwrap_or(FileType::Directory)
            } else {
                FileType::Directory
            };
            children.insert(name, file_type);
        }
        children
    }

    fn not_mounted(path: &Path) -> VfsError {
        VfsError::NotFound(format!("no store mounted for path: {}", path.display()))
    }
}

/// Registrations not hidden by a newer registration at an ancestor path
fn visible(mounts: &[Mount]) -> impl Iterator<Item = (usize, &Mount)> {
    mounts.iter().enumerate().filter(move |(index, m)| {
        !mounts[index + 1..]
            .iter()
            .any(|newer| m.path.starts_with(&newer.path))
    })
}

impl BackingStore for MountTree {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let path = paths::normalize(path);
        let (_, store, rel) = self.resolve(&path).ok_or_else(|| Self::not_mounted(&path))?;
        store.read(&rel)
    }

    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        let path = paths::normalize(path);
        let resolved = self.resolve(&path);

        let direct = match &resolved {
            Some((_, store, rel)) => store.metadata(rel),
            None => Err(Self::not_mounted(&path)),
        };
        if direct.is_ok() || path == Path::new("/") {
            return direct.or(Ok(Metadata::directory()));
        }

        let index = resolved.map(|(index, _, _)| index);
        if self.mounted_children(&path, index).is_empty() {
            direct
        } else {
            Ok(Metadata::directory())
        }
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        let path = paths::normalize(path);
        let resolved = self.resolve(&path);
        let index = resolved.as_ref().map(|(index, _, _)| *index);
        let mounted = self.mounted_children(&path, index);

        let listed = match &resolved {
            Some((_, store, rel)) => store.list_dir(rel),
            None => Err(Self::not_mounted(&path)),
        };

        let mut merged: BTreeMap<String, FileType> = match listed {
            Ok(entries) => entries.into_iter().map(|e| (e.name, e.file_type)).collect(),
            Err(_) if !mounted.is_empty() || path == Path::new("/") => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        merged.extend(mounted);

        Ok(merged
            .into_iter()
            .map(|(name, file_type)| Entry::new_unchecked(name, file_type))
            .collect())
    }

    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let path = paths::normalize(path);
        let (_, store, rel) = self.resolve(&path).ok_or_else(|| Self::not_mounted(&path))?;
        store.write(&rel, data)
    }

    fn create_dir(&self, path: &Path) -> VfsResult<()> {
        let path = paths::normalize(path);
        if self.metadata(&path).is_ok_and(|md| md.is_dir()) {
            return Ok(());
        }
        let (_, store, rel) = self.resolve(&path).ok_or_else(|| Self::not_mounted(&path))?;
        store.create_dir(&rel)
    }

    fn name(&self) -> &str {
        "mount"
    }

    fn readonly(&self) -> bool {
        false
    }
}
