/*!
 * VFS Paths
 * Path normalization and the well-known locations used while staging
 */

use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::types::{VfsError, VfsResult};
use crate::core::limits::SCRATCH_PREFIX;

/// Normalize a store-relative path (make absolute and clean)
pub fn normalize(path: &Path) -> PathBuf {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new("/").join(path)
    };

    PathBuf::from(path_clean::clean(&path))
}

/// Normalize a mount path taken from a mount specification
///
/// Mount paths must be absolute. Trailing slashes are stripped, so
/// `/drivec/` and `/drivec` name the same mount point.
pub fn normalize_mount_path(raw: &str) -> VfsResult<PathBuf> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') {
        return Err(VfsError::InvalidPath(format!(
            "mount path must be absolute: {:?}",
            raw
        )));
    }
    if trimmed.contains('\0') {
        return Err(VfsError::InvalidPath(format!(
            "mount path contains a null byte: {:?}",
            raw
        )));
    }
    Ok(normalize(Path::new(trimmed)))
}

/// Path of `path` relative to `base` in store-root form
///
/// Returns `None` when `path` is not `base` or beneath it.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if path == base {
        return Some(PathBuf::from("/"));
    }
    path.strip_prefix(base)
        .ok()
        .map(|rest| Path::new("/").join(rest))
}

/// Fresh pair of scratch mount points for one archive expansion
pub fn scratch_pair() -> (PathBuf, PathBuf) {
    let id = Uuid::new_v4().simple().to_string();
    let base = PathBuf::from(SCRATCH_PREFIX).join(id);
    (base.join("archive"), base.join("overlay"))
}

/// Check if path lies in the scratch area
pub fn is_scratch_path(path: &Path) -> bool {
    path.starts_with(SCRATCH_PREFIX)
}
