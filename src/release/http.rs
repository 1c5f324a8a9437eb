//! HTTP release feed client.

use super::{ReleaseClient, ReleaseInfo};
use crate::config::HttpConfig;
use crate::error::{Error, Result};
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Accept header for the GitHub REST API.
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Fetches release metadata and asset bytes over HTTP.
#[derive(Debug, Clone)]
pub struct HttpReleaseClient {
    client: Client,
    /// Full URL of the latest-release endpoint.
    feed_url: String,
    /// Total attempts per request, including the first.
    max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry.
    retry_backoff: Duration,
}

impl HttpReleaseClient {
    /// Create a client for the given latest-release endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(feed_url: impl Into<String>, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            feed_url: feed_url.into(),
            max_attempts: http.max_attempts.max(1),
            retry_backoff: Duration::from_millis(http.retry_backoff_ms),
        })
    }

    /// The latest-release endpoint this client queries.
    #[must_use]
    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    /// Send a GET, retrying connect failures, timeouts and 5xx responses.
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<Response> {
        let mut attempt = 1;
        loop {
            let mut request = self.client.get(url);
            if let Some(accept) = accept {
                request = request.header(reqwest::header::ACCEPT, accept);
            }

            let failure = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if !status.is_server_error() {
                        return Err(status_error(url, status));
                    }
                    status_error(url, status)
                }
                Err(e) if e.is_timeout() => {
                    Error::Transport(format!("Request to {url} timed out: {e}"))
                }
                Err(e) => Error::Transport(format!("Request to {url} failed: {e}")),
            };

            if attempt >= self.max_attempts {
                return Err(failure);
            }

            let delay = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
            warn!(
                "Attempt {}/{} failed ({}), retrying in {:?}",
                attempt, self.max_attempts, failure, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn status_error(url: &str, status: StatusCode) -> Error {
    Error::Transport(format!(
        "HTTP {} from {url}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    ))
}

impl ReleaseClient for HttpReleaseClient {
    async fn latest_release(&self) -> Result<ReleaseInfo> {
        debug!("Fetching latest release from {}", self.feed_url);

        let response = self.get(&self.feed_url, Some(GITHUB_ACCEPT)).await?;
        let release: ReleaseInfo = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Malformed release information: {e}")))?;

        info!(
            "Latest release {} with {} asset(s)",
            release.tag_name,
            release.assets.len()
        );
        Ok(release)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let parent = dest
            .parent()
            .ok_or_else(|| Error::Config(format!("No parent directory for {}", dest.display())))?;

        debug!("Downloading {} to {}", url, dest.display());
        let response = self.get(url, None).await?;

        // Stream into a temp file next to `dest` so the rename stays on one filesystem.
        let (file, temp_path) = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(parent)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| Error::Transport(format!("Download of {url} interrupted: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        temp_path.persist(dest).map_err(|e| Error::Io(e.error))?;
        info!("Downloaded {} bytes to {}", written, dest.display());
        Ok(())
    }
}
