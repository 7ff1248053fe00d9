/*!
 * Loader Limits and Constants
 *
 * Centralized location for the well-known paths, capacities and transport
 * settings used by the staging pipeline, grouped by subsystem.
 */

use std::time::Duration;

// =============================================================================
// VFS LAYOUT
// =============================================================================

/// Prefix under which transient archive/overlay scratch mounts live
/// Each expansion appends its own random component beneath it
pub const SCRATCH_PREFIX: &str = "/.scratch";

/// Mount point created in the host runtime filesystem for the registry
pub const HOST_MOUNT_POINT: &str = "/mnt";

// =============================================================================
// EVENTS
// =============================================================================

/// Lifecycle event buffer (1024 events)
/// Slow subscribers lag rather than block the pipeline
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

// =============================================================================
// TRANSPORT
// =============================================================================

/// Per-transfer HTTP timeout (5 minutes)
/// Disk images are large; a timed-out transfer settles as a failure
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// User agent sent with every asset request
pub const USER_AGENT: &str = concat!("emloader/", env!("CARGO_PKG_VERSION"));

/// Upper bound on buffer pre-allocation from a declared size (64 MiB)
/// Declared sizes come from archive headers and `Content-Length`; larger
/// payloads still load, the buffer just grows as bytes arrive
pub const MAX_PREALLOC_BYTES: u64 = 64 * 1024 * 1024;

/// Capacity to reserve for a payload whose size the remote side declares
#[inline]
#[must_use]
pub fn prealloc_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC_BYTES)).unwrap_or(0)
}

// =============================================================================
// PERSISTENT STORAGE
// =============================================================================

/// Default root for origin-scoped persistent stores
pub const DEFAULT_STORAGE_PATH: &str = "/tmp/emloader-storage";

/// Origin used when neither the config nor the webroot provides one
pub const DEFAULT_ORIGIN: &str = "local";

// =============================================================================
// HOST ENVIRONMENT
// =============================================================================

/// Environment variable naming the element that receives keyboard input
pub const KEYBOARD_ELEMENT_VAR: &str = "SDL_EMSCRIPTEN_KEYBOARD_ELEMENT";

/// Selector assigned to [`KEYBOARD_ELEMENT_VAR`]
pub const KEYBOARD_ELEMENT_SELECTOR: &str = "#canvas";
