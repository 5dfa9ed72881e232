//! Fetch stage
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The pluggable [`Fetch`] capability and its reqwest implementation
//! - Building HTTP clients with proper user agent strings and timeouts
//! - The concurrent dispatch loop that turns addresses into pages
//!
//! Every address received produces exactly one [`Page`]. A failed fetch is
//! logged and degrades to a page with an empty body; it is never retried and
//! never aborts the crawl.

use crate::config::{Config, UserAgentConfig};
use crate::crawler::Page;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinSet;
use url::Url;

/// Errors produced while retrieving a single page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status_code} for {url}")]
    Status { url: String, status_code: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },
}

/// Transport capability used by the fetch stage
///
/// Implementations are invoked concurrently from many tasks and must not rely
/// on being called in any particular order.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Retrieves the raw body stored at `address`
    async fn fetch(&self, address: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `request_timeout` - Total time allowed for a request
/// * `connect_timeout` - Time allowed to establish a connection
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sitemapper::config::UserAgentConfig;
/// use sitemapper::crawler::build_http_client;
///
/// let client = build_http_client(
///     &UserAgentConfig::default(),
///     Duration::from_secs(30),
///     Duration::from_secs(10),
/// )
/// .unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    request_timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetch`] implementation backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    html_only: bool,
}

impl HttpFetcher {
    /// Creates a fetcher from the `[fetch]` and `[user-agent]` settings
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.fetch.request_timeout_secs),
            Duration::from_secs(config.fetch.connect_timeout_secs),
        )?;

        Ok(Self::with_client(client, config.fetch.html_only))
    }

    pub fn with_client(client: Client, html_only: bool) -> Self {
        Self { client, html_only }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, address: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(address.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: address.to_string(),
                message: describe_transport_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: address.to_string(),
                status_code: status.as_u16(),
            });
        }

        if self.html_only {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");

            // A missing header is given the benefit of the doubt
            if !content_type.is_empty() && !is_html(content_type) {
                return Err(FetchError::ContentMismatch {
                    url: address.to_string(),
                    content_type: content_type.to_string(),
                });
            }
        }

        let body = response.bytes().await.map_err(|e| FetchError::Body {
            url: address.to_string(),
            message: e.to_string(),
        })?;

        Ok(body.to_vec())
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Starts the fetch stage
///
/// Spawns a dispatch task that receives addresses and spawns one fetch task
/// per address. Completed pages are published on the returned channel in
/// completion order.
///
/// When `addresses` closes, the dispatch loop stops accepting work but only
/// drops the output sender after every spawned fetch has published its page.
pub fn start_fetchers(
    addresses: Receiver<Url>,
    fetcher: Arc<dyn Fetch>,
    capacity: usize,
) -> Receiver<Page> {
    let (pages_tx, pages_rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(dispatch(addresses, fetcher, pages_tx));

    pages_rx
}

async fn dispatch(mut addresses: Receiver<Url>, fetcher: Arc<dyn Fetch>, pages_tx: Sender<Page>) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            received = addresses.recv() => {
                let Some(address) = received else {
                    break;
                };
                let fetcher = Arc::clone(&fetcher);
                let pages_tx = pages_tx.clone();
                in_flight.spawn(fetch_one(fetcher, address, pages_tx));
            }
            // Reap finished fetches so the set does not grow for the whole crawl
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join_failure(joined);
            }
        }
    }

    tracing::info!(
        "Address channel closed, waiting for {} in-flight fetches",
        in_flight.len()
    );

    while let Some(joined) = in_flight.join_next().await {
        log_join_failure(joined);
    }

    tracing::info!("All fetches completed, closing page channel");
    drop(pages_tx);
}

async fn fetch_one(fetcher: Arc<dyn Fetch>, address: Url, pages_tx: Sender<Page>) {
    tracing::debug!("Fetching {}", address);

    // Run the fetch in its own task so a panicking fetcher still yields a page
    let request = {
        let address = address.clone();
        tokio::spawn(async move { fetcher.fetch(&address).await })
    };

    let body = match request.await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            tracing::warn!("Could not fetch {}: {}", address, e);
            Vec::new()
        }
        Err(e) => {
            tracing::error!("Fetch of {} failed: {}", address, e);
            Vec::new()
        }
    };

    tracing::debug!("Fetched {} ({} bytes)", address, body.len());

    if pages_tx.send(Page { address, body }).await.is_err() {
        tracing::warn!("Page channel closed before a fetched page could be delivered");
    }
}

fn log_join_failure(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!("Fetch task failed: {}", e);
    }
}
