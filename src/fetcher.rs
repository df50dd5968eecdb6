//! Fetcher (C4): a single HTTP GET with timeout, retry/backoff, and two
//! counting semaphores (global + per-host) that bound concurrency. Grounded
//! on the Semaphore-guarded `ChromeFetcher`/`BrowserlessFetcher` pattern in
//! `rootsignal-archive::fetchers::page`, simplified to the linear backoff
//! the spec's Python source uses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::FetchError;

pub struct FetcherConfig {
    pub global_limit: usize,
    pub per_host_limit: usize,
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            global_limit: 100,
            per_host_limit: 1,
            timeout: Duration::from_secs(30),
            retries: 3,
        }
    }
}

pub struct Fetcher {
    client: reqwest::Client,
    config: FetcherConfig,
    global: Arc<Semaphore>,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            // No keep-alive reuse: a fresh connection per response, trading
            // throughput for predictability against an aggressively
            // rate-limiting upstream.
            .pool_max_idle_per_host(0)
            .build()
            .expect("reqwest client configuration is always valid");

        Self {
            global: Arc::new(Semaphore::new(config.global_limit)),
            per_host: Mutex::new(HashMap::new()),
            client,
            config,
        }
    }

    fn host_semaphore(&self, url: &str) -> Arc<Semaphore> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
            .unwrap_or_default();

        let mut hosts = self.per_host.lock().expect("per-host map mutex poisoned");
        hosts
            .entry(host)
            .or_insert_with(|| Arc::new(Semaphore::new(self.config.per_host_limit)))
            .clone()
    }

    /// Issue a GET against `url`, retrying transient failures with linear
    /// backoff (`5 * attempt` seconds) up to `config.retries` times.
    /// Acquires both semaphores before the first attempt and releases them
    /// (via RAII) after the final attempt, success or failure.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Bytes, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled { url: url.to_string() });
        }

        let host_sem = self.host_semaphore(url);

        let _global_permit = tokio::select! {
            permit = self.global.acquire() => permit.expect("global semaphore never closed"),
            _ = cancel.cancelled() => return Err(FetchError::Cancelled { url: url.to_string() }),
        };
        let _host_permit = tokio::select! {
            permit = host_sem.acquire() => permit.expect("host semaphore never closed"),
            _ = cancel.cancelled() => return Err(FetchError::Cancelled { url: url.to_string() }),
        };

        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }

            match self.try_once(url).await {
                Ok(bytes) => {
                    info!(url, attempt, bytes = bytes.len(), "fetch succeeded");
                    return Ok(bytes);
                }
                Err(err) => {
                    if attempt >= self.config.retries {
                        warn!(url, attempt, error = %err, "fetch exhausted retries");
                        return Err(match err {
                            AttemptError::Timeout => {
                                FetchError::TimedOut { url: url.to_string(), attempts: attempt }
                            }
                            AttemptError::Status(status) => {
                                FetchError::Status { url: url.to_string(), status }
                            }
                            AttemptError::Transport(source) => FetchError::Exhausted {
                                url: url.to_string(),
                                attempts: attempt,
                                source,
                            },
                        });
                    }

                    warn!(url, attempt, error = %err, "fetch failed, retrying");
                    let backoff = Duration::from_secs(5 * attempt as u64);
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled { url: url.to_string() }),
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn try_once(&self, url: &str) -> Result<Bytes, AttemptError> {
        let response = self.client.get(url).send().await.map_err(AttemptError::from)?;

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => {
                return Err(match err.status() {
                    Some(status) => AttemptError::Status(status),
                    None => AttemptError::from(err),
                })
            }
        };

        response.bytes().await.map_err(AttemptError::from)
    }
}

/// A single attempt's failure, before it is folded into a terminal
/// [`FetchError`] variant once retries are exhausted. `reqwest::Error`
/// collapses timeouts and status failures into one opaque type; this
/// recovers the distinction the spec's §7 taxonomy asks for.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("timed out")]
    Timeout,
    #[error("status {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AttemptError::Timeout
        } else {
            AttemptError::Transport(err)
        }
    }
}
