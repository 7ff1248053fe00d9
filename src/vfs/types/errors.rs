/*!
 * VFS Error Types
 * Structured, type-safe error handling for store and mount operations
 */

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// VFS operation result
///
/// # Must Use
/// Store operations can fail and must be handled to avoid silently missing mounts
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// VFS errors with structured, type-safe error handling
///
/// All error variants include context strings that should be non-empty.
/// Serialization uses tagged enum pattern for type safety.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Not found: {0}")]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already exists: {0}")]
    AlreadyExists(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Permission denied: {0}")]
    PermissionDenied(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not a directory: {0}")]
    NotADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Is a directory: {0}")]
    IsADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid path: {0}")]
    InvalidPath(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("I/O error: {0}")]
    IoError(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid archive: {0}")]
    InvalidArchive(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Read-only store")]
    ReadOnly,
}

/// Deserialize and validate non-empty string for error messages
pub(super) fn deserialize_nonempty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("error message must not be empty"));
    }
    Ok(s)
}
