/*!
 * VFS File Type Enum
 * Kinds of objects a backing store can expose
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// File type enumeration
///
/// Only regular files and directories exist in a staged disk image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Directory,
    Unknown,
}

impl Default for FileType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileType::File => write!(f, "file"),
            FileType::Directory => write!(f, "directory"),
            FileType::Unknown => write!(f, "unknown"),
        }
    }
}
