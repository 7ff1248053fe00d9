/*!
 * VFS Types
 * Shared types for store operations with serde support
 */

mod entry;
mod errors;
mod file_type;
mod metadata;

pub use entry::Entry;
pub use errors::{VfsError, VfsResult};
pub use file_type::FileType;
pub use metadata::Metadata;
