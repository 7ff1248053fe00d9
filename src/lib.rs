/*!
 * Emulator Loader Library
 * Stages a composite filesystem image for a sandboxed runtime
 */

pub mod core;
pub mod loader;
pub mod monitoring;
pub mod runtime;
pub mod vfs;

// Re-exports
pub use crate::core::{LoaderError, LoaderResult, ModuleRoot};
pub use loader::{
    BatchReport, EventBus, HttpTransport, Loader, LoaderConfig, LoaderEvent, LoaderState,
    MountEntry, MountSpec, Transport,
};
pub use monitoring::init_tracing;
pub use runtime::{HostCapabilities, HostFilesystem, HostRuntime, RuntimeModule, StagingHost};
pub use vfs::{
    dump_tree, BackingStore, MountKind, MountTree, VfsComposer, VfsError, VfsRegistry, VfsResult,
};
