//! Selector sets ("recipes") and site identity.
//!
//! A selector set is the stored extraction recipe for one site: the CSS
//! selectors for title, body, and publication date, plus a usage track
//! record. There is exactly one active selector set per site id; an
//! accepted repair overwrites it, an accepted discovery inserts it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// How a site renders its content.
///
/// Static sites can be extracted from raw fetched HTML; dynamic sites need
/// a rendering fetcher before selectors are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    Static,
    Dynamic,
}

/// The stored extraction recipe for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorSet {
    /// Site identity the recipe is keyed by (see [`site_fingerprint`])
    pub site_id: String,

    /// CSS selector for the article title
    pub title_selector: String,

    /// CSS selector for the article body
    pub body_selector: String,

    /// CSS selector for the publication date
    pub date_selector: String,

    /// Rendering mode of the site
    pub site_kind: SiteKind,

    /// Number of quality-gate passes this recipe has produced
    pub success_count: u32,

    /// Number of times this site's recipe has had to be repaired
    pub failure_count: u32,

    /// Confidence carried over from the consensus decision that produced
    /// this recipe (0.0 to 1.0)
    pub confidence: f32,

    /// Last write timestamp
    pub updated_at: DateTime<Utc>,
}

impl SelectorSet {
    /// Create a new recipe with zeroed counters.
    pub fn new(
        site_id: impl Into<String>,
        title_selector: impl Into<String>,
        body_selector: impl Into<String>,
        date_selector: impl Into<String>,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            title_selector: title_selector.into(),
            body_selector: body_selector.into(),
            date_selector: date_selector.into(),
            site_kind: SiteKind::Static,
            success_count: 0,
            failure_count: 0,
            confidence: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// Set the site kind.
    pub fn with_site_kind(mut self, kind: SiteKind) -> Self {
        self.site_kind = kind;
        self
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Record a quality-gate pass.
    pub fn record_success(&mut self) {
        self.success_count += 1;
        self.updated_at = Utc::now();
    }
}

/// Derive the normalized site identifier from a URL.
///
/// The fingerprint is the lowercased host with a leading `www.` stripped,
/// so `https://www.Example.com/a` and `http://example.com/b` key the same
/// stored recipe. Returns `None` for URLs without a host.
pub fn site_fingerprint(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_fingerprint_normalizes_host() {
        assert_eq!(
            site_fingerprint("https://www.Example.com/news/1"),
            Some("example.com".to_string())
        );
        assert_eq!(
            site_fingerprint("http://example.com/other"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_site_fingerprint_rejects_hostless() {
        assert_eq!(site_fingerprint("not a url"), None);
        assert_eq!(site_fingerprint("mailto:a@b.com"), None);
    }

    #[test]
    fn test_record_success_bumps_counter() {
        let mut set = SelectorSet::new("example.com", "h1", "article", "time");
        let before = set.updated_at;
        set.record_success();
        assert_eq!(set.success_count, 1);
        assert!(set.updated_at >= before);
    }
}
