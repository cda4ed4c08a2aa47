//! HTTPS delivery of signed batches.
//!
//! One call is one POST. The sender never retries and never returns an
//! error: every failure mode (connect, TLS, timeout, non-200, unexpected
//! body) collapses to `false`, and the delivery worker decides what to do
//! next.
//!
//! # Architecture
//!
//! ```text
//! DeliveryWorker
//!     │
//!     ├─> Signer ──> SignedBatch { body, signature }
//!     │
//!     └─> HttpSender ───(HTTPS POST ?signature=...)───> Collector
//!                                                        │
//!                              200 "success" ◄───────────┘
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use cardrelay_core::{ScanEvent, StationId};
//! use cardrelay_network::{HttpSender, HttpSenderConfig, RemoteSender, Signer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signer = Signer::from_base64("c2VjcmV0")?;
//! let sender = HttpSender::new(HttpSenderConfig::new(
//!     "https://script.google.com/macros/s/abc/exec",
//! ))?;
//!
//! let batch = signer.sign_batch(&[ScanEvent::new("123", StationId::new("lobby"))])?;
//! if sender.send(&batch).await {
//!     println!("delivered");
//! }
//! # Ok(())
//! # }
//! ```

use crate::signer::SignedBatch;
use cardrelay_core::constants::{DEFAULT_REQUEST_TIMEOUT_MS, SIGNATURE_PARAM, SUCCESS_MARKER};
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// One delivery attempt of a signed batch.
///
/// Implementations report success strictly as a boolean and never retry.
/// The returned future must be `Send` so the delivery worker can run on a
/// spawned task.
pub trait RemoteSender: Send + Sync {
    /// Attempt delivery once. `true` only if the collector confirmed it.
    fn send(&self, batch: &SignedBatch) -> impl Future<Output = bool> + Send;
}

/// Configuration for [`HttpSender`].
///
/// # Example
///
/// ```
/// use cardrelay_network::HttpSenderConfig;
/// use std::time::Duration;
///
/// let config = HttpSenderConfig::new("https://collector.example/exec")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpSenderConfig {
    /// Collector endpoint.
    pub url: String,

    /// Whole-request timeout.
    pub timeout: Duration,
}

impl HttpSenderConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Errors building an [`HttpSender`].
#[derive(Debug, Error)]
pub enum SenderError {
    /// Collector URL does not parse.
    #[error("Invalid collector URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP client could not be constructed (e.g. TLS backend failure).
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Collector client over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
}

impl HttpSender {
    /// Build a sender for `config.url`.
    ///
    /// # Errors
    ///
    /// Returns `SenderError::InvalidUrl` for a malformed URL and
    /// `SenderError::Client` if the HTTP client cannot be built.
    pub fn new(config: HttpSenderConfig) -> Result<Self, SenderError> {
        let url = reqwest::Url::parse(&config.url).map_err(|e| SenderError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cardrelay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url,
            timeout: config.timeout,
        })
    }

    /// Collector endpoint this sender posts to.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn post(&self, batch: &SignedBatch) -> Result<bool, reqwest::Error> {
        let response = self
            .client
            .post(self.url.clone())
            .query(&[(SIGNATURE_PARAM, batch.signature.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .body(batch.body.clone())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        trace!(%status, body = %body, "Collector replied");

        if status != reqwest::StatusCode::OK {
            warn!(%status, scans = batch.len(), "Collector rejected batch");
            return Ok(false);
        }
        if body != SUCCESS_MARKER {
            warn!(scans = batch.len(), "Collector returned unexpected body");
            return Ok(false);
        }
        Ok(true)
    }
}

impl RemoteSender for HttpSender {
    async fn send(&self, batch: &SignedBatch) -> bool {
        debug!(scans = batch.len(), bytes = batch.body.len(), "Posting batch");

        match self.post(batch).await {
            Ok(delivered) => delivered,
            Err(e) if e.is_timeout() => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Collector request timed out");
                false
            }
            Err(e) => {
                warn!(error = %e, "Collector request failed");
                false
            }
        }
    }
}
