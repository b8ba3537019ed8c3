//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a browser-like user agent
//! - Pacing requests so the forum sees at most one per interval
//! - Error classification

use crate::config::ForumConfig;
use crate::state::RequestPacer;
use crate::url::{thread_endpoint, thread_page_url};
use crate::{FetchError, FloorwatchError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Source of raw thread pages
///
/// The crawl engine only ever asks for a page URL and its markup, so tests
/// can stand in an in-memory source for the real forum.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Builds the URL of one page of a thread
    fn page_url(&self, board_id: u64, thread_id: u64, page: u32) -> String;

    /// Fetches the markup at `url`
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The forum configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ForumConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page source backed by the live forum
pub struct HttpFetcher {
    client: Client,
    endpoint: Url,
    pacer: Mutex<RequestPacer>,
}

impl HttpFetcher {
    /// Creates a fetcher for the forum described by `config`
    pub fn new(config: &ForumConfig) -> Result<Self, FloorwatchError> {
        let client = build_http_client(config)?;
        let endpoint = thread_endpoint(&config.base_url)?;
        let pacer = RequestPacer::new(Duration::from_millis(config.min_request_interval));

        Ok(Self {
            client,
            endpoint,
            pacer: Mutex::new(pacer),
        })
    }

    /// Number of requests sent so far
    pub async fn request_count(&self) -> u32 {
        self.pacer.lock().await.request_count
    }

    /// Waits until the pacer allows another request, then claims the slot
    async fn wait_for_slot(&self) {
        let mut pacer = self.pacer.lock().await;
        if let Some(wait) = pacer.time_until_next_request(Instant::now()) {
            tracing::trace!("Pacing: waiting {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
        pacer.record_request(Instant::now());
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    fn page_url(&self, board_id: u64, thread_id: u64, page: u32) -> String {
        thread_page_url(&self.endpoint, board_id, thread_id, page).to_string()
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.wait_for_slot().await;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a transport error onto the fetch error the engine reports
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect { url }
    } else {
        FetchError::Network {
            url,
            message: error.to_string(),
        }
    }
}
