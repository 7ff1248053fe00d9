/*!
 * VFS Metadata
 * Minimal per-node metadata exposed by backing stores
 */

use super::file_type::FileType;
use serde::{Deserialize, Serialize};

/// Node metadata
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Metadata {
    pub file_type: FileType,
    #[serde(default)]
    pub size: u64,
}

impl Metadata {
    #[inline]
    #[must_use]
    pub const fn file(size: u64) -> Self {
        Self {
            file_type: FileType::File,
            size,
        }
    }

    #[inline]
    #[must_use]
    pub const fn directory() -> Self {
        Self {
            file_type: FileType::Directory,
            size: 0,
        }
    }

    /// Check if this is a directory
    ///
    /// # Performance
    /// Hot path - called once per node during archive expansion
    #[inline(always)]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }
}
