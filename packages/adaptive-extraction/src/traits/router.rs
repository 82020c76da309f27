//! The routing-vote capability for the optional majority-vote mode.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::traits::ProviderIdentity;
use crate::types::task::UcState;

/// The routing question put to each voter.
///
/// Voters are routing agents, not extractors: they see the task's position
/// and quality context, never the raw HTML.
#[derive(Debug, Clone)]
pub struct RouteQuestion {
    /// The state the task is leaving
    pub current: UcState,

    /// Site the task is working on
    pub site_id: String,

    /// Whether a stored recipe exists for the site
    pub has_recipe: bool,

    /// The last quality-gate total, if a gate has run
    pub last_quality: Option<u8>,

    /// Legal answers; votes outside this set are discarded
    pub options: Vec<UcState>,
}

/// An independent reasoning agent answering routing questions.
#[async_trait]
pub trait RouteVoter: ProviderIdentity + Send + Sync {
    /// Pick the next state for the task.
    async fn vote(&self, question: &RouteQuestion) -> ProviderResult<UcState>;
}
