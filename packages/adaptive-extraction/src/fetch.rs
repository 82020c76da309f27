//! HTTP-backed page fetcher.
//!
//! The default [`PageFetcher`] implementation for static sites. Dynamic
//! sites that need rendering plug in their own fetcher behind the same
//! trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedPage, PageFetcher};

/// Fetches pages over plain HTTP.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: "AdaptiveExtraction/1.0".to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        if Url::parse(url).is_err() {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http {
                        url: url.to_string(),
                        source: Box::new(e),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Capture the final URL after redirects
        let final_url = response.url().clone();

        let html = response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: Box::new(e),
        })?;

        Ok(FetchedPage {
            url: final_url.to_string(),
            html,
            status: status.as_u16(),
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_any_request() {
        let fetcher = HttpFetcher::new();
        let result = fetcher.fetch("not a url at all").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
