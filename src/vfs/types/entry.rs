/*!
 * VFS Directory Entry
 * Represents entries in a directory with validation
 */

use super::errors::VfsError;
use super::file_type::FileType;
use serde::{Deserialize, Deserializer, Serialize};

/// Directory entry with type-safe construction and validation
///
/// Entry names must be non-empty and cannot contain null bytes or path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    #[serde(deserialize_with = "deserialize_valid_filename")]
    pub name: String,
    #[serde(default)]
    pub file_type: FileType,
}

impl Entry {
    /// Create a new entry with validation
    #[must_use = "validation result must be checked"]
    pub fn new(name: String, file_type: FileType) -> Result<Self, VfsError> {
        Self::validate_name(&name)?;
        Ok(Self { name, file_type })
    }

    /// Create a new entry without validation (internal use)
    pub(crate) fn new_unchecked(name: String, file_type: FileType) -> Self {
        Self { name, file_type }
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }

    /// Validate entry name
    #[must_use = "validation result must be checked"]
    pub fn validate_name(name: &str) -> Result<(), VfsError> {
        if name.is_empty() {
            return Err(VfsError::InvalidPath("entry name cannot be empty".into()));
        }
        if name.contains('\0') {
            return Err(VfsError::InvalidPath(
                "entry name cannot contain null bytes".into(),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(VfsError::InvalidPath(
                "entry name cannot contain path separators".into(),
            ));
        }
        Ok(())
    }
}

/// Deserialize and validate filename
fn deserialize_valid_filename<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Entry::validate_name(&name).map_err(serde::de::Error::custom)?;
    Ok(name)
}
