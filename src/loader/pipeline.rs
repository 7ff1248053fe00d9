/*!
 * Loader Pipeline
 * Fetch, materialize, finalize, then hand the runtime its module
 */

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::config::LoaderConfig;
use super::events::{EventBus, LoaderEvent};
use super::fetcher::{AssetFetcher, BatchReport, FetchFailure, Transport};
use super::http::HttpTransport;
use super::resolver::MountResolver;
use super::state::{LoaderState, StateCell};
use crate::core::errors::LoaderResult;
use crate::core::limits::{KEYBOARD_ELEMENT_SELECTOR, KEYBOARD_ELEMENT_VAR};
use crate::monitoring::span_stage;
use crate::runtime::{HostRuntime, PreRunHook, RuntimeModule};
use crate::vfs::{StoreFactory, VfsComposer, VfsRegistry};

/// One loader instance
///
/// Owns the lifecycle from mount specification to a launched runtime. The
/// runtime never starts before every mount of the batch has settled.
pub struct Loader {
    config: LoaderConfig,
    transport: Arc<dyn Transport>,
    registry: VfsRegistry,
    events: EventBus,
    state: StateCell,
    composer: Option<VfsComposer>,
}

impl Loader {
    /// Loader using HTTP transfers and the process-wide registry
    pub fn new(config: LoaderConfig) -> LoaderResult<Self> {
        let transport = Arc::new(HttpTransport::new()?);
        Ok(Self::with_transport(config, transport, VfsRegistry::global()))
    }

    pub fn with_transport(config: LoaderConfig, transport: Arc<dyn Transport>, registry: &VfsRegistry) -> Self {
        Self {
            config,
            transport,
            registry: registry.clone(),
            events: EventBus::default(),
            state: StateCell::new(),
            composer: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> LoaderState {
        self.state.get()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Composer of this loader's tree, once the filesystem pipeline ran
    pub fn composer(&self) -> Option<&VfsComposer> {
        self.composer.as_ref()
    }

    /// Run the whole pipeline against `host`
    ///
    /// Without a mount specification the runtime is started directly.
    pub async fn start<H: HostRuntime>(&mut self, host: &mut H) -> LoaderResult<BatchReport> {
        let flags = self.config.detect_capabilities(host.capabilities());
        let mut pre_run = vec![init_environment()];
        let mut report = BatchReport::default();

        if let Some(spec) = self.config.mount_spec.clone() {
            let root = self.config.module_root()?;
            let composer = VfsComposer::new(root, &self.registry);
            let factory = StoreFactory::new(self.config.storage_root(), self.config.origin());
            let mut resolver = MountResolver::new(factory, composer.clone(), self.config.webroot_url()?);
            let mut fetcher = AssetFetcher::new(self.transport.clone(), self.events.clone());

            self.state.advance(LoaderState::FetchingBatch)?;
            let stage = span_stage("fetch_batch");
            resolver.resolve(&spec, &mut fetcher)?;
            report = fetcher.run_batch().await;
            stage.record_items(report.settled());
            drop(stage);

            self.state.advance(LoaderState::Materializing)?;
            for (path, error) in resolver.take_commit_failures() {
                report.failed.push(FetchFailure {
                    url: path.display().to_string(),
                    error,
                });
            }
            if !resolver.is_settled() {
                warn!("Batch closed with unsettled entries");
            }

            pre_run.push(finalize(composer.clone(), self.state.clone(), fetcher.pending()));
            self.composer = Some(composer);
        } else {
            info!("No mount specification; starting runtime directly");
            self.state.advance(LoaderState::RuntimeStarting)?;
        }

        let module = RuntimeModule {
            executable: self.config.executable.clone(),
            arguments: self.config.executable_args.clone(),
            export_name: self.config.export_name.clone(),
            canvas: self.config.canvas.clone(),
            flags,
            pre_run,
        };
        host.launch(module)?;
        self.state.advance(LoaderState::Running)?;

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Runtime started"
        );
        Ok(report)
    }
}

/// Point the runtime's keyboard handling at the canvas
fn init_environment() -> PreRunHook {
    PreRunHook::new("init_environment", |host| {
        if let Some(env) = host.environment() {
            env.insert(
                KEYBOARD_ELEMENT_VAR.to_string(),
                KEYBOARD_ELEMENT_SELECTOR.to_string(),
            );
        }
        Ok(())
    })
}

/// Bridge the composed tree into the host before the guest starts
fn finalize(composer: VfsComposer, state: StateCell, pending: usize) -> PreRunHook {
    PreRunHook::new("finalize", move |host| {
        state.advance(LoaderState::FinalizingVfs)?;
        composer.finalize(host.filesystem(), pending)?;
        state.advance(LoaderState::RuntimeStarting)
    })
}
