//! The page fetch interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FetchResult;

/// A fetched page: the raw HTML plus transport metadata.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was fetched (after redirects)
    pub url: String,

    /// Raw page HTML
    pub html: String,

    /// HTTP status code
    pub status: u16,

    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    /// Create a fetched page.
    pub fn new(url: impl Into<String>, html: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            status,
            fetched_at: Utc::now(),
        }
    }
}

/// HTML fetch transport, an external collaborator.
///
/// A fetch failure fails the task fast: no repair is attempted, since
/// there is nothing to extract from.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page by URL.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;
}
