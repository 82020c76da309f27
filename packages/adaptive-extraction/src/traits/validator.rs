//! The validator capability.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::traits::ProviderIdentity;
use crate::types::consensus::Validation;
use crate::types::recipe::SelectorSet;

/// An agent capability that independently assesses a candidate recipe's
/// plausibility against the live page.
///
/// Validators never see the proposer's confidence or rationale; their
/// assessment must be independent for the consensus combination to mean
/// anything.
#[async_trait]
pub trait RecipeValidator: ProviderIdentity + Send + Sync {
    /// Assess a candidate selector set against the page HTML.
    async fn validate(&self, html: &str, candidate: &SelectorSet) -> ProviderResult<Validation>;
}
