/*!
 * Runtime Module
 * Host runtime contract and the in-process staging host
 */

pub mod bridge;
pub mod staging;

pub use bridge::{
    HostCapabilities, HostFilesystem, HostRuntime, PreRunHook, RuntimeFlags, RuntimeModule,
};
pub use staging::{LaunchRecord, StagingHost};
