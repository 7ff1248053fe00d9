/*!
 * HTTP Transport
 * reqwest-backed transfers with streamed progress; `file://` from disk
 */

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, Url};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::fetcher::{FetchResponse, ProgressReporter, Transport};
use crate::core::errors::{LoaderError, LoaderResult};
use crate::core::limits::{prealloc_hint, HTTP_TIMEOUT, USER_AGENT};

/// Production transport
///
/// `http(s)` locators go through a shared [`Client`]; `file://` URLs and
/// bare paths are read from the local disk.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> LoaderResult<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LoaderError::Network {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    async fn fetch_remote(client: Client, url: String, progress: ProgressReporter) -> LoaderResult<FetchResponse> {
        let network = |e: reqwest::Error| LoaderError::Network {
            url: url.clone(),
            reason: e.to_string(),
        };

        let mut response = client.get(&url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Non-success response");
            return Ok(FetchResponse {
                status: status.as_u16(),
                body: Bytes::new(),
            });
        }

        let total = response.content_length();
        let mut body = BytesMut::with_capacity(prealloc_hint(total.unwrap_or(0)));
        while let Some(chunk) = response.chunk().await.map_err(network)? {
            body.extend_from_slice(&chunk);
            progress.report(body.len() as u64, total);
        }

        debug!(url = %url, bytes = body.len(), "Transfer finished");
        Ok(FetchResponse {
            status: status.as_u16(),
            body: body.freeze(),
        })
    }

    async fn fetch_local(path: PathBuf, url: String, progress: ProgressReporter) -> LoaderResult<FetchResponse> {
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| LoaderError::Network {
                url,
                reason: format!("{}: {e}", path.display()),
            })?;
        let len = data.len() as u64;
        progress.report(len, Some(len));
        Ok(FetchResponse::ok(data))
    }
}

/// Local path for `file://` URLs and locators without a scheme
fn local_path(locator: &str) -> Option<PathBuf> {
    match Url::parse(locator) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        Ok(_) => None,
        Err(_) => Some(PathBuf::from(locator)),
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: String, progress: ProgressReporter) -> BoxFuture<'static, LoaderResult<FetchResponse>> {
        match local_path(&url) {
            Some(path) => Self::fetch_local(path, url, progress).boxed(),
            None => Self::fetch_remote(self.client.clone(), url, progress).boxed(),
        }
    }
}
