/*!
 * Shared fixtures for loader tests
 */

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::time::Duration;
use tokio::sync::broadcast;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use emloader::loader::{FetchResponse, LoaderEvent, ProgressReporter, Transport};
use emloader::{LoaderError, LoaderResult};

/// Canned reply for one url
#[derive(Clone)]
pub struct Reply {
    status: u16,
    body: Bytes,
    delay: Duration,
}

impl Reply {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
            delay: Duration::ZERO,
        }
    }

    /// Settle only after `ms` milliseconds
    pub fn after(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }
}

/// Transport serving canned replies; unknown urls fail at the transport level
#[derive(Default)]
pub struct MockTransport {
    replies: HashMap<String, Reply>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, reply: Reply) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }
}

impl Transport for MockTransport {
    fn fetch(&self, url: String, progress: ProgressReporter) -> BoxFuture<'static, LoaderResult<FetchResponse>> {
        let reply = self.replies.get(&url).cloned();
        async move {
            let Some(reply) = reply else {
                return Err(LoaderError::Network {
                    url,
                    reason: "connection refused".into(),
                });
            };
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            let len = reply.body.len() as u64;
            progress.report(len, Some(len));
            Ok(FetchResponse {
                status: reply.status,
                body: reply.body,
            })
        }
        .boxed()
    }
}

pub fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Everything received so far, without waiting
pub fn drain(rx: &mut broadcast::Receiver<LoaderEvent>) -> Vec<LoaderEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn count(events: &[LoaderEvent], pred: impl Fn(&LoaderEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
