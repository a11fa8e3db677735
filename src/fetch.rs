//! HTTP page fetching.
//!
//! All outgoing requests share one [`reqwest::Client`] carrying a browser-like
//! `User-Agent`, since the news site rejects unidentified clients. Timeouts are
//! fixed per request kind and are the only way a request is ever cut short.

use crate::BoxError;
use futures::future::BoxFuture;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Identifying header sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const ARTICLE_TIMEOUT: Duration = Duration::from_secs(12);
pub const NEWS_API_TIMEOUT: Duration = Duration::from_secs(10);
pub const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(10);
pub const RSS_TIMEOUT: Duration = Duration::from_secs(6);
pub const CHANNEL_PAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the shared HTTP client.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Source of raw article markup.
///
/// The pipeline only depends on this trait so tests can count or fake
/// network access.
pub trait PageFetcher: Send + Sync {
    /// Download the page at `url`, failing on transport errors and on any
    /// non-success status.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, BoxError>>;
}

/// [`PageFetcher`] backed by the shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: ARTICLE_TIMEOUT,
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, BoxError>> {
        Box::pin(get_text(&self.client, url, self.timeout))
    }
}

/// GET `url` and return the body, treating non-2xx statuses as errors.
#[instrument(level = "info", skip(client), fields(%url))]
pub async fn get_text(client: &Client, url: &str, timeout: Duration) -> Result<String, BoxError> {
    let t0 = Instant::now();
    let response = client.get(url).timeout(timeout).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!(%status, "Request returned non-success status");
        return Err(format!("HTTP {status} for {url}").into());
    }
    let body = response.text().await?;
    info!(
        bytes = body.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Fetched page"
    );
    Ok(body)
}
