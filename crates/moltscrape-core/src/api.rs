//! Moltbook API client with bounded retry
//!
//! Uses the async reqwest client internally, driven synchronously through a
//! shared tokio runtime so the harvest loop stays a single blocking thread.

use std::sync::LazyLock;
use std::time::Duration;

use crate::post::Post;
use crate::retry::backoff_delay;

/// Hard upper bound for one request attempt.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connect timeout for the shared client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client-identifying header sent with every request.
const USER_AGENT: &str = "MoltbookScraper/1.0";

/// Shared HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// One page of posts as reported by the API.
///
/// `success: false` or an empty `posts` list means the source is exhausted,
/// not that the request failed.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_offset: Option<u64>,
}

/// Failure of a single fetch attempt. Every variant is transient and
/// retried; only retry exhaustion is surfaced past the client boundary.
#[derive(Debug)]
pub enum FetchError {
    Http {
        status: Option<u16>,
        message: String,
    },
    Timeout,
    Body(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Timeout => write!(f, "request timed out after {}s", ATTEMPT_TIMEOUT.as_secs()),
            Self::Body(msg) => write!(f, "bad response body: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// Outcome of fetching one batch, retries included.
#[derive(Debug)]
pub enum FetchOutcome {
    Batch(BatchResponse),
    /// All attempts failed. The batch did not advance, but the run is not
    /// fatally broken; the caller decides whether to skip or abort.
    RetryExhausted,
}

/// Source of paginated post batches.
///
/// The seam between the orchestrator and the network; scenario tests
/// substitute a scripted implementation.
pub trait BatchSource {
    fn fetch_batch(&mut self, offset: u64, limit: u64) -> FetchOutcome;
}

/// HTTP client for the Moltbook posts endpoint.
pub struct MoltbookClient {
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl MoltbookClient {
    pub fn new(base_url: impl Into<String>, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    /// Fetch `limit` posts starting at `offset`, retrying transient
    /// failures with exponential backoff. Never returns an error: all
    /// attempts failing collapses into [`FetchOutcome::RetryExhausted`].
    pub fn fetch_batch(&self, offset: u64, limit: u64) -> FetchOutcome {
        let url = format!(
            "{}/posts?sort=top&limit={limit}&offset={offset}",
            self.base_url
        );

        for attempt in 0..self.max_retries {
            match self.attempt(&url) {
                Ok(batch) => return FetchOutcome::Batch(batch),
                Err(e) => {
                    log::warn!("attempt {}/{} failed: {e}", attempt + 1, self.max_retries);
                    if attempt + 1 < self.max_retries {
                        let wait = backoff_delay(self.base_delay, attempt);
                        log::debug!("retrying in {}s...", wait.as_secs());
                        std::thread::sleep(wait);
                    }
                }
            }
        }

        log::warn!("giving up on offset {offset} after {} attempts", self.max_retries);
        FetchOutcome::RetryExhausted
    }

    fn attempt(&self, url: &str) -> Result<BatchResponse, FetchError> {
        let body = SHARED_RUNTIME.handle().block_on(async {
            let request = async {
                let resp = SHARED_CLIENT
                    .get(url)
                    .header(reqwest::header::USER_AGENT, USER_AGENT)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| FetchError::from_reqwest(&e))?;
                resp.text().await.map_err(|e| FetchError::from_reqwest(&e))
            };
            match tokio::time::timeout(ATTEMPT_TIMEOUT, request).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            }
        })?;

        serde_json::from_str(&body).map_err(|e| FetchError::Body(e.to_string()))
    }
}

impl BatchSource for MoltbookClient {
    fn fetch_batch(&mut self, offset: u64, limit: u64) -> FetchOutcome {
        MoltbookClient::fetch_batch(self, offset, limit)
    }
}
