/*!
 * Asset Fetcher
 * Concurrent transfers tracked by a single batch pending counter
 *
 * All transfers are driven from the calling task through one
 * `FuturesUnordered`; nothing is spawned. A batch opens on the first
 * `schedule` after the counter was zero and closes exactly when the
 * counter drops from one to zero, whatever order transfers settle in.
 */

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use super::events::{EventBus, LoaderEvent};
use crate::core::errors::{LoaderError, LoaderResult};

/// Settled response of one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Emits `FileProgress` for one transfer
#[derive(Clone)]
pub struct ProgressReporter {
    url: String,
    events: EventBus,
}

impl ProgressReporter {
    pub fn report(&self, bytes_loaded: u64, bytes_total: Option<u64>) {
        self.events.emit(LoaderEvent::FileProgress {
            url: self.url.clone(),
            bytes_loaded,
            bytes_total,
        });
    }
}

/// Binary transfer backend
///
/// A returned error is a transport failure; a non-2xx status is returned as
/// a normal response and judged by the fetcher.
pub trait Transport: Send + Sync {
    fn fetch(&self, url: String, progress: ProgressReporter) -> BoxFuture<'static, LoaderResult<FetchResponse>>;
}

/// Receives the outcome of one scheduled transfer
pub trait Materializer: Send {
    /// Build and mount from the fetched body
    fn materialize(self: Box<Self>, body: Bytes) -> LoaderResult<()>;

    /// The transfer failed; nothing will be mounted for this entry
    fn abandon(self: Box<Self>, reason: &str);
}

/// One failed entry of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: LoaderError,
}

/// Outcome of a closed batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<FetchFailure>,
}

impl BatchReport {
    pub fn settled(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

struct Settled {
    url: String,
    materializer: Box<dyn Materializer>,
    result: LoaderResult<FetchResponse>,
}

/// Asset fetcher
pub struct AssetFetcher {
    transport: Arc<dyn Transport>,
    events: EventBus,
    pending: usize,
    in_flight: FuturesUnordered<BoxFuture<'static, Settled>>,
    report: BatchReport,
}

impl AssetFetcher {
    pub fn new(transport: Arc<dyn Transport>, events: EventBus) -> Self {
        Self {
            transport,
            events,
            pending: 0,
            in_flight: FuturesUnordered::new(),
            report: BatchReport::default(),
        }
    }

    /// Transfers scheduled but not yet settled
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Queue one transfer
    ///
    /// The transfer makes progress only while [`run_batch`](Self::run_batch)
    /// is being awaited.
    pub fn schedule(&mut self, url: String, materializer: Box<dyn Materializer>) {
        if self.pending == 0 {
            self.report = BatchReport::default();
            info!("Batch opened");
            self.events.emit(LoaderEvent::BatchBegin);
        }
        self.pending += 1;
        self.events.emit(LoaderEvent::FileBegin { url: url.clone() });

        let progress = ProgressReporter {
            url: url.clone(),
            events: self.events.clone(),
        };
        let span = info_span!("transfer", url = %url);
        let transfer = self.transport.fetch(url.clone(), progress);

        self.in_flight.push(
            async move {
                let result = transfer.await;
                Settled {
                    url,
                    materializer,
                    result,
                }
            }
            .instrument(span)
            .boxed(),
        );
    }

    /// Open and immediately close a batch with no transfers
    ///
    /// Keeps `BatchBegin`/`BatchComplete` paired for specifications that
    /// need no network at all.
    pub fn close_empty(&mut self) -> BatchReport {
        debug_assert_eq!(self.pending, 0);
        info!("Batch opened and closed with no transfers");
        self.events.emit(LoaderEvent::BatchBegin);
        self.events.emit(LoaderEvent::BatchComplete);
        BatchReport::default()
    }

    /// Drive every outstanding transfer to settlement
    pub async fn run_batch(&mut self) -> BatchReport {
        while let Some(settled) = self.in_flight.next().await {
            self.settle(settled);
        }
        std::mem::take(&mut self.report)
    }

    fn settle(&mut self, settled: Settled) {
        let Settled {
            url,
            materializer,
            result,
        } = settled;

        let outcome = match result {
            Ok(response) if response.is_success() => {
                debug!(url = %url, bytes = response.body.len(), "Transfer succeeded");
                materializer.materialize(response.body)
            }
            Ok(response) => {
                let reason = format!("HTTP status {}", response.status);
                materializer.abandon(&reason);
                Err(LoaderError::Network {
                    url: url.clone(),
                    reason,
                })
            }
            Err(e) => {
                materializer.abandon(&e.to_string());
                Err(e)
            }
        };

        match outcome {
            Ok(()) => self.report.succeeded.push(url.clone()),
            Err(error) => {
                warn!(url = %url, error = %error, "Entry skipped");
                self.events.emit(LoaderEvent::FileError {
                    url: url.clone(),
                    reason: error.to_string(),
                });
                self.report.failed.push(FetchFailure {
                    url: url.clone(),
                    error,
                });
            }
        }
        self.events.emit(LoaderEvent::FileComplete { url });

        self.pending -= 1;
        if self.pending == 0 {
            info!(
                succeeded = self.report.succeeded.len(),
                failed = self.report.failed.len(),
                "Batch complete"
            );
            self.events.emit(LoaderEvent::BatchComplete);
        }
    }
}
