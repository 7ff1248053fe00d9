/*!
 * Virtual File System Module
 * Layered stores composed into one mount tree per loader
 */

pub mod archive;
pub mod composer;
pub mod dump;
pub mod factory;
pub mod file;
pub mod memory;
pub mod mount;
pub mod paths;
pub mod persistent;
pub mod registry;
pub mod traits;
pub mod types;

// Re-exports
pub use archive::ArchiveStore;
pub use composer::VfsComposer;
pub use dump::dump_tree;
pub use factory::{BuiltStore, MountKind, StoreFactory};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use mount::MountTree;
pub use persistent::PersistentStore;
pub use registry::VfsRegistry;
pub use traits::BackingStore;
pub use types::{Entry, FileType, Metadata, VfsError, VfsResult};
