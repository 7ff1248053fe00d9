/*!
 * Loader State
 * Forward-only lifecycle of one loader
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::core::errors::{LoaderError, LoaderResult};

/// Loader lifecycle state
///
/// Transitions only move forward; there is no cancel or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderState {
    /// Constructed, nothing started
    Idle,
    /// Transfers of the mount batch are outstanding
    FetchingBatch,
    /// Every transfer settled; stores are being committed
    Materializing,
    /// Bridging the registry into the host filesystem
    FinalizingVfs,
    /// Pre-run hooks are executing
    RuntimeStarting,
    /// Guest program handed to the host
    Running,
}

impl LoaderState {
    /// Whether `next` is reachable from this state
    #[inline]
    pub fn can_transition_to(self, next: LoaderState) -> bool {
        next > self
    }
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoaderState::Idle => "idle",
            LoaderState::FetchingBatch => "fetching_batch",
            LoaderState::Materializing => "materializing",
            LoaderState::FinalizingVfs => "finalizing_vfs",
            LoaderState::RuntimeStarting => "runtime_starting",
            LoaderState::Running => "running",
        };
        f.write_str(name)
    }
}

/// Shared, observable loader state
///
/// Cloned into pre-run hooks so transitions made while the host runs them
/// are visible to the loader.
#[derive(Debug, Clone)]
pub struct StateCell(Arc<Mutex<LoaderState>>);

impl StateCell {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(LoaderState::Idle)))
    }

    pub fn get(&self) -> LoaderState {
        *self.0.lock()
    }

    /// Move to `next`, refusing backward or repeated transitions
    pub fn advance(&self, next: LoaderState) -> LoaderResult<()> {
        let mut state = self.0.lock();
        let from = *state;
        if !from.can_transition_to(next) {
            return Err(LoaderError::InvalidTransition { from, to: next });
        }
        info!(from = %from, to = %next, "Loader state changed");
        *state = next;
        Ok(())
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
