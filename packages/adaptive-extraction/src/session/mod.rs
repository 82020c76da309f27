//! Repair and discovery sessions.
//!
//! Both are the same bounded consensus loop (PROPOSE, VALIDATE,
//! CONSENSUS) parameterized by whether a prior recipe exists. A repair
//! session hands the failing recipe to proposers as negative context and
//! overwrites it on acceptance; a discovery session starts from nothing
//! and inserts. On exhaustion the session writes an escalation record and
//! leaves any prior recipe untouched; an unaccepted candidate never
//! reaches the store.

pub mod fallback;

pub use fallback::ProviderChain;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, ProviderError, Result};
use crate::extract;
use crate::scoring;
use crate::traits::{FetchedPage, Proposer, RecipeStore, RecipeValidator};
use crate::types::config::SupervisorConfig;
use crate::types::consensus::{ConsensusResult, Proposal, Validation};
use crate::types::escalation::{EscalationKind, EscalationRecord};
use crate::types::recipe::SelectorSet;
use crate::types::task::CrawlTask;

/// Whether the session repairs an existing recipe or discovers a first
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// A recipe exists for the site but is failing the quality gate
    Repair,

    /// No recipe exists for the site yet
    Discovery,
}

impl SessionMode {
    /// The consensus threshold configured for this mode.
    pub fn threshold(&self, config: &SupervisorConfig) -> f32 {
        match self {
            SessionMode::Repair => config.repair_threshold,
            SessionMode::Discovery => config.discovery_threshold,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Repair => "repair",
            SessionMode::Discovery => "discovery",
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// A candidate cleared consensus and was persisted
    Accepted {
        /// The recipe as written to the store
        recipe: SelectorSet,

        /// The accepting decision
        consensus: ConsensusResult,

        /// Consensus rounds run, including the accepting one
        rounds: u32,
    },

    /// The retry budget ran out; an escalation record was written
    Escalated {
        /// The record as appended to the store
        record: EscalationRecord,
    },
}

/// One repair or discovery session over a single task.
pub struct ConsensusSession<'a, S: RecipeStore + ?Sized> {
    store: &'a S,
    proposers: &'a ProviderChain<dyn Proposer>,
    validators: &'a ProviderChain<dyn RecipeValidator>,
    config: &'a SupervisorConfig,
}

impl<'a, S: RecipeStore + ?Sized> ConsensusSession<'a, S> {
    /// Create a session over the given capabilities and store.
    pub fn new(
        store: &'a S,
        proposers: &'a ProviderChain<dyn Proposer>,
        validators: &'a ProviderChain<dyn RecipeValidator>,
        config: &'a SupervisorConfig,
    ) -> Self {
        Self {
            store,
            proposers,
            validators,
            config,
        }
    }

    /// Run the consensus loop to completion.
    ///
    /// Every decision made along the way is appended to `trace`. Returns
    /// `Err` only for infrastructure failures (storage, cancellation);
    /// both escalation and acceptance are ordinary outcomes.
    pub async fn run(
        &self,
        task: &CrawlTask,
        page: &FetchedPage,
        mode: SessionMode,
        prior: Option<&SelectorSet>,
        trace: &mut Vec<ConsensusResult>,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome> {
        let threshold = mode.threshold(self.config);
        let html = page.html.as_str();

        let mut retries_used: u32 = 0;
        let mut last_proposal: Option<Proposal> = None;
        let mut last_validation: Option<Validation> = None;

        while retries_used < self.config.max_consensus_retries {
            let round = retries_used + 1;

            // PROPOSE
            let proposal = match self
                .proposers
                .call("propose", cancel, |p| async move {
                    p.propose(html, prior).await
                })
                .await
            {
                Ok(proposal) => proposal,
                Err(ProviderError::Cancelled) => return Err(OrchestratorError::Cancelled),
                Err(err) => {
                    warn!(
                        site_id = %task.site_id,
                        mode = mode.as_str(),
                        round,
                        error = %err,
                        "propose round failed across all providers"
                    );
                    retries_used += 1;
                    continue;
                }
            };

            // VALIDATE
            let candidate = &proposal.candidate;
            let validation = match self
                .validators
                .call("validate", cancel, |v| async move {
                    v.validate(html, candidate).await
                })
                .await
            {
                Ok(validation) => validation,
                Err(ProviderError::Cancelled) => return Err(OrchestratorError::Cancelled),
                Err(err) => {
                    warn!(
                        site_id = %task.site_id,
                        mode = mode.as_str(),
                        round,
                        error = %err,
                        "validate round failed across all providers"
                    );
                    last_proposal = Some(proposal);
                    retries_used += 1;
                    continue;
                }
            };

            // CONSENSUS, with extraction quality recomputed against the
            // live HTML, never a value cached from the proposal step.
            let (_, extraction_quality) =
                extract::apply(&proposal.candidate, html, &task.url, &self.config.rubric);

            let result = scoring::decide(
                proposal.proposer_confidence,
                validation.validator_confidence,
                extraction_quality,
                &self.config.weights,
                threshold,
            );
            trace.push(result);

            debug!(
                site_id = %task.site_id,
                mode = mode.as_str(),
                round,
                score = result.score,
                extraction_quality,
                accepted = result.accepted,
                "consensus round decided"
            );

            if result.accepted {
                let recipe = accepted_recipe(task, &proposal, &result, prior);
                self.store.upsert_selector_set(&recipe).await?;
                info!(
                    site_id = %task.site_id,
                    mode = mode.as_str(),
                    rounds = round,
                    score = result.score,
                    "recipe accepted and persisted"
                );
                return Ok(SessionOutcome::Accepted {
                    recipe,
                    consensus: result,
                    rounds: round,
                });
            }

            last_proposal = Some(proposal);
            last_validation = Some(validation);
            retries_used += 1;
        }

        // Retry budget spent: escalate, leaving any prior recipe as-is.
        let record = EscalationRecord::new(
            task,
            EscalationKind::ConsensusExhausted,
            last_proposal,
            last_validation,
            retries_used,
        );
        self.store.append_escalation(&record).await?;
        warn!(
            site_id = %task.site_id,
            mode = mode.as_str(),
            retries_used,
            escalation_id = %record.id,
            "consensus exhausted, escalating"
        );
        Ok(SessionOutcome::Escalated { record })
    }
}

/// Build the recipe an accepted proposal persists.
///
/// The candidate's site id is forced to the task's, its confidence becomes
/// the consensus score, and the failure counter records one more repair on
/// the site.
fn accepted_recipe(
    task: &CrawlTask,
    proposal: &Proposal,
    result: &ConsensusResult,
    prior: Option<&SelectorSet>,
) -> SelectorSet {
    let mut recipe = proposal.candidate.clone();
    recipe.site_id = task.site_id.clone();
    recipe.confidence = result.score;
    recipe.success_count = 0;
    recipe.failure_count = prior.map_or(0, |p| p.failure_count + 1);
    recipe.updated_at = chrono::Utc::now();
    recipe
}
