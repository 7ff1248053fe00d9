/*!
 * Persistent Store
 * Durable, origin-scoped directory store on the host disk
 */

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use super::traits::BackingStore;
use super::types::*;

/// Directory store that survives the process
///
/// Every origin gets its own directory under the storage root, and every
/// mount path gets its own subdirectory beneath that, so two loaders served
/// from the same origin and mounting the same path see the same data.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    root: PathBuf,
}

impl PersistentStore {
    /// Open (creating if absent) the store for `origin` and `mount_path`
    pub fn open(storage_root: &Path, origin: &str, mount_path: &Path) -> VfsResult<Self> {
        let mut root = storage_root.join(sanitize_segment(origin));
        for component in mount_path.components() {
            if let Component::Normal(name) = component {
                root.push(sanitize_segment(&name.to_string_lossy()));
            }
        }

        let created = !root.exists();
        fs::create_dir_all(&root)
            .map_err(|e| Self::io_error(e, format!("create store {}", root.display())))?;

        if created {
            info!(root = %root.display(), origin = %origin, "Created persistent store");
        } else {
            debug!(root = %root.display(), origin = %origin, "Opened persistent store");
        }
        Ok(Self { root })
    }

    /// Host directory backing this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve path relative to root with proper normalization
    /// `..` never climbs above the store root
    fn resolve(&self, path: &Path) -> PathBuf {
        let mut components = Vec::with_capacity(8);

        for component in path.components() {
            match component {
                Component::Normal(name) => components.push(name),
                Component::ParentDir => {
                    components.pop();
                }
                _ => {}
            }
        }

        let mut result = self.root.clone();
        for component in components {
            result.push(component);
        }
        result
    }

    /// Convert std::io::Error to VfsError
    fn io_error(e: std::io::Error, context: impl Into<String>) -> VfsError {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::NotFound => VfsError::NotFound(context.into()),
            ErrorKind::PermissionDenied => VfsError::PermissionDenied(context.into()),
            ErrorKind::AlreadyExists => VfsError::AlreadyExists(context.into()),
            _ => VfsError::IoError(format!("{}: {}", context.into(), e)),
        }
    }

    fn convert_file_type(ft: fs::FileType) -> FileType {
        if ft.is_dir() {
            FileType::Directory
        } else if ft.is_file() {
            FileType::File
        } else {
            FileType::Unknown
        }
    }
}

/// Make an arbitrary string safe to use as one directory name
fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

impl BackingStore for PersistentStore {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let full_path = self.resolve(path);
        fs::read(&full_path).map_err(|e| Self::io_error(e, format!("read {}", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        let full_path = self.resolve(path);
        let md = fs::metadata(&full_path)
            .map_err(|e| Self::io_error(e, format!("metadata {}", path.display())))?;
        Ok(Metadata {
            file_type: Self::convert_file_type(md.file_type()),
            size: if md.is_dir() { 0 } else { md.len() },
        })
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        let full_path = self.resolve(path);
        let entries = fs::read_dir(&full_path)
            .map_err(|e| Self::io_error(e, format!("list_dir {}", path.display())))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| Self::io_error(e, format!("read dir entry in {}", path.display())))?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| VfsError::InvalidPath("invalid UTF-8 in filename".to_string()))?;
            let file_type = entry
                .file_type()
                .map_err(|e| Self::io_error(e, format!("get file type for {}", name)))?;

            match Entry::new(name, Self::convert_file_type(file_type)) {
                Ok(entry) => result.push(entry),
                Err(e) => warn!(dir = %path.display(), error = %e, "Skipping unrepresentable host entry"),
            }
        }

        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let full_path = self.resolve(path);
        if full_path == self.root {
            return Err(VfsError::IsADirectory(path.display().to_string()));
        }

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Self::io_error(e, format!("create parent dirs for {}", path.display()))
            })?;
        }

        fs::write(&full_path, data)
            .map_err(|e| Self::io_error(e, format!("write {}", path.display())))
    }

    fn create_dir(&self, path: &Path) -> VfsResult<()> {
        let full_path = self.resolve(path);
        fs::create_dir_all(&full_path)
            .map_err(|e| Self::io_error(e, format!("create_dir {}", path.display())))
    }

    fn name(&self) -> &str {
        "persistent"
    }

    fn readonly(&self) -> bool {
        false
    }
}
