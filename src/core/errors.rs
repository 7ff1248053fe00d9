/*!
 * Error Types
 * Pipeline error handling with thiserror and miette
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::vfs::VfsError;
use crate::loader::LoaderState;

/// Loader operation result
///
/// # Must Use
/// Pipeline operations can fail and must be handled before the runtime starts
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised by the fetch/materialize/finalize pipeline
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum LoaderError {
    #[error("Unsupported mount kind: {0}")]
    #[diagnostic(
        code(loader::unsupported_kind),
        help("Valid kinds are \"file\", \"archive\" and \"persistent-local\".")
    )]
    UnsupportedKind(String),

    #[error("Mount {0} needs a source locator")]
    #[diagnostic(
        code(loader::missing_source),
        help("File and archive mounts are written as [kind, url].")
    )]
    MissingSource(String),

    #[error("Failed to parse archive for {path}: {reason}")]
    #[diagnostic(
        code(loader::archive_parse),
        help("The source did not return a valid zip container.")
    )]
    ArchiveParse { path: String, reason: String },

    #[error("Transfer of {url} failed: {reason}")]
    #[diagnostic(code(loader::network))]
    Network { url: String, reason: String },

    #[error("Invalid mount specification: {0}")]
    #[diagnostic(code(loader::invalid_spec))]
    InvalidSpec(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(loader::invalid_config))]
    InvalidConfig(String),

    #[error("Batch still open with {0} pending transfer(s)")]
    #[diagnostic(
        code(loader::batch_open),
        help("The filesystem can only be finalized once every transfer has settled.")
    )]
    BatchOpen(usize),

    #[error("Invalid loader state transition: {from} -> {to}")]
    #[diagnostic(code(loader::invalid_transition))]
    InvalidTransition { from: LoaderState, to: LoaderState },

    #[error("Host runtime error: {0}")]
    #[diagnostic(code(loader::runtime))]
    Runtime(String),

    #[error(transparent)]
    #[diagnostic(code(loader::vfs))]
    Vfs(#[from] VfsError),
}
