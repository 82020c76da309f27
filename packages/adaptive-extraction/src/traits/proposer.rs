//! The proposer capability.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::traits::ProviderIdentity;
use crate::types::consensus::Proposal;
use crate::types::recipe::SelectorSet;

/// An agent capability that suggests a candidate extraction recipe for a
/// page.
///
/// Implementations wrap a concrete provider (an LLM endpoint, a heuristic
/// engine, a human-in-the-loop queue); the core only depends on this
/// contract and an ordered fallback list of instances. The wire format of
/// the underlying call is the implementation's business.
#[async_trait]
pub trait Proposer: ProviderIdentity + Send + Sync {
    /// Propose a selector set for the page.
    ///
    /// For repair sessions `prior_failing` carries the recipe that stopped
    /// passing the quality gate, as negative context; discovery sessions
    /// pass `None`.
    async fn propose(
        &self,
        html: &str,
        prior_failing: Option<&SelectorSet>,
    ) -> ProviderResult<Proposal>;
}
