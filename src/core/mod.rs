/*!
 * Core Module
 * Identifiers, limits and pipeline error types
 */

pub mod errors;
pub mod id;
pub mod limits;

// Re-export for convenience
pub use errors::{LoaderError, LoaderResult};
pub use id::ModuleRoot;
