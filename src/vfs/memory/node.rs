/*!
 * Memory Store Node Types
 * Internal representation of files and directories
 */

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::super::types::{FileType, Metadata};

/// In-memory store node
///
/// Directory children are kept ordered so listings and copies are deterministic.
#[derive(Debug, Clone)]
pub(in crate::vfs) enum Node {
    File { data: Vec<u8> },
    Directory { children: BTreeMap<String, PathBuf> },
}

impl Node {
    pub fn empty_dir() -> Self {
        Node::Directory {
            children: BTreeMap::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Node::File { .. } => FileType::File,
            Node::Directory { .. } => FileType::Directory,
        }
    }

    pub fn metadata(&self) -> Metadata {
        match self {
            Node::File { data } => Metadata::file(data.len() as u64),
            Node::Directory { .. } => Metadata::directory(),
        }
    }
}
