//! Typed errors for the orchestrator.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Note that a selector set extracting nothing is NOT an error anywhere in
//! this crate. Zero-quality extraction is a normal, scoreable value; only
//! infrastructure failures (network, storage, misconfiguration) surface as
//! error types.

use thiserror::Error;

/// Errors surfaced by the supervisor and sessions.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Configuration rejected at startup
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Page fetch failed (task fails fast, no repair attempted)
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

/// Configuration errors. Fatal at construction time: a supervisor with an
/// invalid config must never accept a task.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Consensus weights must sum to 1.0 (within 1e-6)
    #[error("consensus weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f32 },

    /// Consensus weights must be non-negative
    #[error("consensus weight {name} is negative: {value}")]
    NegativeWeight { name: &'static str, value: f32 },

    /// A threshold is outside its valid range
    #[error("{name} out of range: {value}")]
    ThresholdRange { name: &'static str, value: f32 },

    /// Quality rubric weights must sum to 100
    #[error("quality rubric weights sum to {sum}, expected 100")]
    RubricSum { sum: u32 },

    /// A retry or loop budget must be at least 1
    #[error("{name} must be at least 1")]
    ZeroBudget { name: &'static str },
}

/// Errors from the page fetch interface.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failure
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Non-success HTTP status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Fetch exceeded its deadline
    #[error("timeout fetching {url}")]
    Timeout { url: String },
}

/// Errors from proposer/validator/voter providers.
///
/// These propagate through the provider fallback chain and only become a
/// consensus-round failure once every configured provider has failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider did not respond within the per-call timeout
    #[error("provider {provider} timed out")]
    Timeout { provider: String },

    /// Provider is unreachable or returned a transient failure
    #[error("provider {provider} unavailable: {source}")]
    Unavailable {
        provider: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Authentication or authorization failure
    #[error("provider {provider} rejected credentials")]
    Auth { provider: String },

    /// Quota or rate limit exhausted at the provider
    #[error("provider {provider} quota exhausted")]
    Quota { provider: String },

    /// Provider answered with something unusable
    #[error("provider {provider} returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },

    /// Every provider in the fallback chain failed
    #[error("all {providers} providers exhausted")]
    Exhausted {
        providers: usize,
        #[source]
        last: Option<Box<ProviderError>>,
    },

    /// Call was cancelled mid-flight
    #[error("provider call cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether retrying the same provider could plausibly succeed.
    ///
    /// Auth and quota failures won't clear within a backoff window, so the
    /// chain moves straight to the next provider for those.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout { .. } | ProviderError::Unavailable { .. }
        )
    }
}

/// Errors from the recipe/escalation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure (connection, serialization, ...)
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Escalation id not present in the store
    #[error("escalation not found: {id}")]
    EscalationNotFound { id: uuid::Uuid },
}

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Timeout {
            provider: "a".into()
        }
        .is_retryable());
        assert!(!ProviderError::Auth {
            provider: "a".into()
        }
        .is_retryable());
        assert!(!ProviderError::Quota {
            provider: "a".into()
        }
        .is_retryable());
    }
}
