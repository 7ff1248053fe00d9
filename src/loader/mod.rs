/*!
 * Loader Module
 * Asynchronous fetch-and-materialize pipeline feeding the VFS composer
 */

pub mod config;
pub mod events;
pub mod fetcher;
pub mod http;
pub mod mount_spec;
pub mod pipeline;
pub mod presets;
pub mod resolver;
pub mod state;

// Re-exports
pub use config::LoaderConfig;
pub use events::{EventBus, LoaderEvent};
pub use fetcher::{
    AssetFetcher, BatchReport, FetchFailure, FetchResponse, Materializer, ProgressReporter,
    Transport,
};
pub use http::HttpTransport;
pub use mount_spec::{MountEntry, MountSpec};
pub use pipeline::Loader;
pub use resolver::MountResolver;
pub use state::{LoaderState, StateCell};
