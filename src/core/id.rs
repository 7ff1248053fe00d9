/*!
 * ID Generation
 * Module root identifiers isolating each loader inside the shared registry
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::vfs::paths::normalize_mount_path;
use crate::vfs::{VfsError, VfsResult};

/// Namespace prefix of one loader's mount tree (`/<uuid>`)
///
/// Two loaders in one process must never share a module root; generated
/// roots are random v4 UUIDs so collisions are not a practical concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleRoot(PathBuf);

impl ModuleRoot {
    /// Generate a fresh, process-unique module root
    pub fn generate() -> Self {
        Self(PathBuf::from(format!("/{}", Uuid::new_v4())))
    }

    /// Use a caller-supplied module path
    ///
    /// The path is normalized like a mount path and must not be `/`.
    pub fn new(raw: &str) -> VfsResult<Self> {
        let path = normalize_mount_path(raw)?;
        if path == Path::new("/") {
            return Err(VfsError::InvalidPath(
                "module root cannot be the registry root".into(),
            ));
        }
        Ok(Self(path))
    }

    #[inline]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Join a module-relative path onto this root
    pub fn join(&self, path: &Path) -> PathBuf {
        let rel = path.strip_prefix("/").unwrap_or(path);
        if rel.as_os_str().is_empty() {
            self.0.clone()
        } else {
            self.0.join(rel)
        }
    }
}

impl fmt::Display for ModuleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ModuleRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
