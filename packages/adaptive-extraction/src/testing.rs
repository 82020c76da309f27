//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that embed the orchestrator
//! without making real AI or network calls. Every mock is scriptable
//! (fixed answers, failure injection, hangs) and records the calls made
//! to it for assertions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, ProviderError, ProviderResult};
use crate::traits::{
    FetchedPage, PageFetcher, Proposer, ProviderIdentity, RecipeValidator, RouteQuestion,
    RouteVoter,
};
use crate::types::consensus::{Proposal, Validation};
use crate::types::recipe::SelectorSet;
use crate::types::task::UcState;

/// A mock proposer returning a fixed candidate.
pub struct MockProposer {
    name: String,
    candidate: SelectorSet,
    confidence: f32,
    fail_first: AtomicU32,
    always_fail: bool,
    hang: bool,
    calls: Arc<RwLock<Vec<MockProposerCall>>>,
}

/// Record of a call made to a mock proposer.
#[derive(Debug, Clone)]
pub struct MockProposerCall {
    /// Whether a prior failing recipe was passed as negative context
    pub had_prior: bool,

    /// Length of the HTML the proposer saw
    pub html_len: usize,
}

impl MockProposer {
    /// Create a proposer suggesting the standard test recipe with
    /// confidence 0.8.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidate: standard_recipe("example.com"),
            confidence: 0.8,
            fail_first: AtomicU32::new(0),
            always_fail: false,
            hang: false,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the candidate to propose.
    pub fn with_candidate(mut self, candidate: SelectorSet) -> Self {
        self.candidate = candidate;
        self
    }

    /// Set the self-reported confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Fail the first `n` calls with a transient error.
    pub fn fail_times(self, n: u32) -> Self {
        self.fail_first.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every call with a transient error.
    pub fn always_failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    /// Never answer; used to exercise the per-call timeout.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Calls made to this mock.
    pub fn calls(&self) -> Vec<MockProposerCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

impl ProviderIdentity for MockProposer {
    fn provider_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Proposer for MockProposer {
    async fn propose(
        &self,
        html: &str,
        prior_failing: Option<&SelectorSet>,
    ) -> ProviderResult<Proposal> {
        self.calls.write().unwrap().push(MockProposerCall {
            had_prior: prior_failing.is_some(),
            html_len: html.len(),
        });

        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if self.always_fail
            || self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(ProviderError::Unavailable {
                provider: self.name.clone(),
                source: "mock proposer failure".into(),
            });
        }

        Ok(Proposal::new(
            self.candidate.clone(),
            self.confidence,
            "mock rationale",
            &self.name,
        ))
    }
}

/// A mock validator returning a fixed assessment.
pub struct MockValidator {
    name: String,
    plausible: bool,
    confidence: f32,
    fail_first: AtomicU32,
    hang: bool,
    calls: Arc<RwLock<Vec<MockValidatorCall>>>,
}

/// Record of a call made to a mock validator.
#[derive(Debug, Clone)]
pub struct MockValidatorCall {
    /// The title selector of the candidate under assessment
    pub candidate_title_selector: String,
}

impl MockValidator {
    /// Create a validator answering plausible with confidence 0.8.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plausible: true,
            confidence: 0.8,
            fail_first: AtomicU32::new(0),
            hang: false,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the plausibility verdict.
    pub fn with_plausible(mut self, plausible: bool) -> Self {
        self.plausible = plausible;
        self
    }

    /// Set the self-reported confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Fail the first `n` calls with a transient error.
    pub fn fail_times(self, n: u32) -> Self {
        self.fail_first.store(n, Ordering::SeqCst);
        self
    }

    /// Never answer; used to exercise the per-call timeout.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

impl ProviderIdentity for MockValidator {
    fn provider_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl RecipeValidator for MockValidator {
    async fn validate(&self, _html: &str, candidate: &SelectorSet) -> ProviderResult<Validation> {
        self.calls.write().unwrap().push(MockValidatorCall {
            candidate_title_selector: candidate.title_selector.clone(),
        });

        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ProviderError::Unavailable {
                provider: self.name.clone(),
                source: "mock validator failure".into(),
            });
        }

        Ok(Validation::new(
            self.plausible,
            self.confidence,
            "mock feedback",
            &self.name,
        ))
    }
}

/// A mock fetcher serving predefined pages without network requests.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    fail_urls: Vec<String>,
}

impl MockFetcher {
    /// Create an empty mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Fail fetches of `url` with a connection error.
    pub fn fail_url(mut self, url: impl Into<String>) -> Self {
        self.fail_urls.push(url.into());
        self
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        if self.fail_urls.iter().any(|u| u == url) {
            return Err(FetchError::Http {
                url: url.to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "mock connection refused",
                )),
            });
        }

        match self.pages.get(url) {
            Some(html) => Ok(FetchedPage::new(url, html.clone(), 200)),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// A mock routing voter with a fixed ballot.
pub struct MockVoter {
    name: String,
    answer: UcState,
    delay: Duration,
    fail: bool,
}

impl MockVoter {
    /// Create a voter that always answers `answer` immediately.
    pub fn new(name: impl Into<String>, answer: UcState) -> Self {
        Self {
            name: name.into(),
            answer,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    /// Delay the answer, e.g. past the vote deadline.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every vote with a transient error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl ProviderIdentity for MockVoter {
    fn provider_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl RouteVoter for MockVoter {
    async fn vote(&self, _question: &RouteQuestion) -> ProviderResult<UcState> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(ProviderError::Unavailable {
                provider: self.name.clone(),
                source: "mock voter failure".into(),
            });
        }
        Ok(self.answer)
    }
}

/// The recipe matching pages built by [`article_html`].
pub fn standard_recipe(site_id: impl Into<String>) -> SelectorSet {
    SelectorSet::new(site_id, "h1.headline", "article p", "time.published")
}

/// Build an article page with the standard test markup.
///
/// Pair with [`standard_recipe`] for a recipe that extracts it cleanly.
pub fn article_html(title: &str, body: &str, date: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body>\
         <h1 class=\"headline\">{title}</h1>\
         <article><p>{body}</p></article>\
         <time class=\"published\" datetime=\"{date}\">{date}</time>\
         </body></html>"
    )
}

/// A body long enough to earn full rubric credit.
pub fn long_body() -> String {
    "This paragraph pads the article body well past the full-credit length threshold. "
        .repeat(10)
}
