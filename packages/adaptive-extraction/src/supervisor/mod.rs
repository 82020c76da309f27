//! The supervisor: the top-level state machine driving every task.
//!
//! A task traverses `INIT → GATE → {DONE_OK | REPAIR | DISCOVER} → ...`
//! as a strictly sequential loop of pure transition decisions: each
//! working state executes, produces an event, and the router maps the
//! event to the next state. The task value is owned exclusively by the
//! driver and rebuilt per step; there is no shared mutable blob threaded
//! through the machine.
//!
//! Failure handling is the point of the design: fetch errors fail fast,
//! provider errors burn through the fallback chain before costing a
//! consensus retry, exhausted sessions escalate with a record, and the
//! loop guard caps how often any state can repeat before the task is
//! forced to escalate. Every path ends in a terminal outcome; no task is
//! ever lost or left running.

pub mod routing;

pub use routing::{legal_successors, majority_vote, rule_table, RouteEvent};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, OrchestratorError, Result};
use crate::extract::{self, ExtractedFields};
use crate::session::{ConsensusSession, ProviderChain, SessionMode, SessionOutcome};
use crate::traits::{
    PageFetcher, Proposer, RecipeStore, RecipeValidator, RouteQuestion, RouteVoter,
};
use crate::types::config::{RoutingStrategy, SupervisorConfig};
use crate::types::consensus::ConsensusResult;
use crate::types::escalation::{EscalationKind, EscalationRecord};
use crate::types::quality::QualityScore;
use crate::types::recipe::site_fingerprint;
use crate::types::task::{CrawlOutcome, CrawlStatus, CrawlTask, FailureKind, UcState};
use uuid::Uuid;

/// The orchestrator over one store, one fetcher, and ordered provider
/// chains.
///
/// Construction validates the configuration; an invalid config yields an
/// error and no instance, so a misconfigured supervisor can never accept
/// a task. Instances are explicitly owned: embedders construct as many
/// independent supervisors as they need and there is no global state.
pub struct Supervisor<S: RecipeStore, F: PageFetcher> {
    store: S,
    fetcher: F,
    proposers: ProviderChain<dyn Proposer>,
    validators: ProviderChain<dyn RecipeValidator>,
    voters: Vec<Arc<dyn RouteVoter>>,
    config: SupervisorConfig,
}

impl<S: RecipeStore, F: PageFetcher> Supervisor<S, F> {
    /// Create a supervisor with the default configuration.
    pub fn new(
        store: S,
        fetcher: F,
        proposers: Vec<Arc<dyn Proposer>>,
        validators: Vec<Arc<dyn RecipeValidator>>,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_config(store, fetcher, proposers, validators, SupervisorConfig::default())
    }

    /// Create a supervisor with a custom configuration.
    pub fn with_config(
        store: S,
        fetcher: F,
        proposers: Vec<Arc<dyn Proposer>>,
        validators: Vec<Arc<dyn RecipeValidator>>,
        config: SupervisorConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            proposers: ProviderChain::from_config(proposers, &config),
            validators: ProviderChain::from_config(validators, &config),
            voters: Vec::new(),
            store,
            fetcher,
            config,
        })
    }

    /// Attach routing voters for majority-vote mode.
    pub fn with_voters(mut self, voters: Vec<Arc<dyn RouteVoter>>) -> Self {
        self.voters = voters;
        self
    }

    /// The configuration in force.
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// A reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one URL to a terminal outcome.
    pub async fn handle(&self, url: &str, site_id: &str) -> Result<CrawlOutcome> {
        self.handle_with_cancel(url, site_id, CancellationToken::new())
            .await
    }

    /// Run one URL, deriving the site id from the URL's host.
    pub async fn handle_url(&self, url: &str) -> Result<CrawlOutcome> {
        match site_fingerprint(url) {
            Some(site_id) => self.handle(url, &site_id).await,
            None => {
                warn!(url, "URL has no host to fingerprint");
                Ok(finish_failed(
                    CrawlTask::new(url, ""),
                    FailureKind::Fetch,
                    Vec::new(),
                ))
            }
        }
    }

    /// Run one URL to a terminal outcome, honoring a cancellation signal.
    ///
    /// Cancellation aborts the current wait (including provider backoff)
    /// and resolves the task as `Failed`/cancelled rather than leaking it.
    pub async fn handle_with_cancel(
        &self,
        url: &str,
        site_id: &str,
        cancel: CancellationToken,
    ) -> Result<CrawlOutcome> {
        let mut task = CrawlTask::new(url, site_id);
        info!(task_id = %task.id, url, site_id, "task accepted");

        let mut trace: Vec<ConsensusResult> = Vec::new();

        // Fetch once per task, failing fast: with no HTML there is nothing
        // to extract from and nothing to repair against.
        let page = tokio::select! {
            result = self.fetcher.fetch(url) => match result {
                Ok(page) => page,
                Err(err) => {
                    warn!(task_id = %task.id, url, error = %err, "fetch failed, no repair attempted");
                    return Ok(finish_failed(task, FailureKind::Fetch, trace));
                }
            },
            () = cancel.cancelled() => {
                return Ok(finish_failed(task, FailureKind::Cancelled, trace));
            }
        };

        let mut state = UcState::Init;
        let mut last_fields: Option<ExtractedFields> = None;
        let mut last_quality: Option<QualityScore> = None;
        let mut escalation: Option<(Uuid, FailureKind)> = None;

        loop {
            state = match state {
                UcState::Init => UcState::Gate,

                UcState::Gate => {
                    if self.loop_guard_tripped(&mut task, UcState::Gate, &mut escalation).await? {
                        UcState::Escalate
                    } else {
                        let recipe = self.store.get_selector_set(&task.site_id).await?;
                        task.recipe_snapshot = recipe.clone();

                        match recipe {
                            Some(current) => {
                                let (fields, score) = extract::apply_scored(
                                    &current,
                                    &page.html,
                                    &task.url,
                                    &self.config.rubric,
                                );
                                last_quality = Some(score);
                                debug!(
                                    task_id = %task.id,
                                    site_id = %task.site_id,
                                    total = score.total,
                                    threshold = self.config.pass_threshold,
                                    "quality gate scored"
                                );

                                if score.passes(self.config.pass_threshold) {
                                    let mut passing = current;
                                    passing.record_success();
                                    self.store.upsert_selector_set(&passing).await?;
                                    last_fields = Some(fields);
                                    self.route(
                                        RouteEvent::GatePassed,
                                        UcState::Gate,
                                        &task,
                                        true,
                                        Some(score.total),
                                    )
                                    .await
                                } else {
                                    task.failure_count += 1;
                                    self.route(
                                        RouteEvent::GateFailedWithRecipe,
                                        UcState::Gate,
                                        &task,
                                        true,
                                        Some(score.total),
                                    )
                                    .await
                                }
                            }
                            None => {
                                self.route(
                                    RouteEvent::GateFailedNoRecipe,
                                    UcState::Gate,
                                    &task,
                                    false,
                                    None,
                                )
                                .await
                            }
                        }
                    }
                }

                current @ (UcState::Repair | UcState::Discover) => {
                    if self.loop_guard_tripped(&mut task, current, &mut escalation).await? {
                        UcState::Escalate
                    } else {
                        let mode = match current {
                            UcState::Repair => SessionMode::Repair,
                            _ => SessionMode::Discovery,
                        };
                        let prior = match mode {
                            SessionMode::Repair => task.recipe_snapshot.clone(),
                            SessionMode::Discovery => None,
                        };

                        let session = ConsensusSession::new(
                            &self.store,
                            &self.proposers,
                            &self.validators,
                            &self.config,
                        );
                        let outcome = match session
                            .run(&task, &page, mode, prior.as_ref(), &mut trace, &cancel)
                            .await
                        {
                            Ok(outcome) => outcome,
                            Err(OrchestratorError::Cancelled) => {
                                return Ok(finish_failed(task, FailureKind::Cancelled, trace));
                            }
                            Err(err) => return Err(err),
                        };

                        match outcome {
                            SessionOutcome::Accepted { .. } => {
                                self.route(
                                    RouteEvent::SessionAccepted,
                                    current,
                                    &task,
                                    true,
                                    last_quality.map(|q| q.total),
                                )
                                .await
                            }
                            SessionOutcome::Escalated { record } => {
                                escalation = Some((record.id, FailureKind::ConsensusExhausted));
                                self.route(
                                    RouteEvent::SessionEscalated,
                                    current,
                                    &task,
                                    true,
                                    last_quality.map(|q| q.total),
                                )
                                .await
                            }
                        }
                    }
                }

                UcState::Escalate => {
                    task.record_visit(UcState::Escalate);
                    info!(task_id = %task.id, site_id = %task.site_id, "task escalated for human review");
                    UcState::DoneFail
                }

                UcState::DoneOk => {
                    info!(
                        task_id = %task.id,
                        site_id = %task.site_id,
                        path = ?task.attempt_log,
                        "task succeeded"
                    );
                    return Ok(finish_success(task, last_fields, last_quality, trace));
                }

                UcState::DoneFail => {
                    return Ok(match escalation {
                        Some((id, kind)) => finish_escalated(task, id, kind, last_quality, trace),
                        None => finish_failed(task, FailureKind::Cancelled, trace),
                    });
                }
            };
        }
    }

    /// Record a visit and trip the loop guard when the state has repeated
    /// past its budget.
    ///
    /// The guard is the safety valve against GATE/REPAIR ping-pong on a
    /// fundamentally non-extractable site. It writes its own escalation
    /// record, logged distinctly from consensus exhaustion.
    async fn loop_guard_tripped(
        &self,
        task: &mut CrawlTask,
        state: UcState,
        escalation: &mut Option<(Uuid, FailureKind)>,
    ) -> Result<bool> {
        let visits = task.record_visit(state);
        if visits <= self.config.max_loop_repeats {
            return Ok(false);
        }

        warn!(
            task_id = %task.id,
            site_id = %task.site_id,
            state = %state,
            visits,
            max = self.config.max_loop_repeats,
            "loop guard tripped, forcing escalation"
        );
        let record = EscalationRecord::new(task, EscalationKind::LoopGuardTripped, None, None, 0);
        self.store.append_escalation(&record).await?;
        *escalation = Some((record.id, FailureKind::LoopGuardTripped));
        Ok(true)
    }

    /// Compute the next state for an event.
    ///
    /// The rule table answers directly unless majority-vote mode is on,
    /// the event is genuinely ambiguous, and voters are attached; an
    /// inconclusive vote falls back to the table.
    async fn route(
        &self,
        event: RouteEvent,
        from: UcState,
        task: &CrawlTask,
        has_recipe: bool,
        last_quality: Option<u8>,
    ) -> UcState {
        let fallback = routing::rule_table(event);
        let options = routing::legal_successors(event);

        if options.len() < 2
            || self.config.routing != RoutingStrategy::MajorityVote
            || self.voters.is_empty()
        {
            return fallback;
        }

        let question = RouteQuestion {
            current: from,
            site_id: task.site_id.clone(),
            has_recipe,
            last_quality,
            options: options.to_vec(),
        };

        match routing::majority_vote(
            &self.voters,
            &question,
            self.config.vote_deadline,
            self.config.min_responders,
        )
        .await
        {
            Some(choice) => {
                debug!(task_id = %task.id, from = %from, choice = %choice, "majority vote routed");
                choice
            }
            None => fallback,
        }
    }
}

fn finish_success(
    task: CrawlTask,
    fields: Option<ExtractedFields>,
    quality: Option<QualityScore>,
    trace: Vec<ConsensusResult>,
) -> CrawlOutcome {
    CrawlOutcome {
        status: CrawlStatus::Success,
        fields,
        quality,
        uc_path: task.attempt_log,
        consensus_trace: trace,
        failure: None,
        escalation_id: None,
    }
}

fn finish_escalated(
    task: CrawlTask,
    escalation_id: Uuid,
    kind: FailureKind,
    quality: Option<QualityScore>,
    trace: Vec<ConsensusResult>,
) -> CrawlOutcome {
    CrawlOutcome {
        status: CrawlStatus::Escalated,
        fields: None,
        quality,
        uc_path: task.attempt_log,
        consensus_trace: trace,
        failure: Some(kind),
        escalation_id: Some(escalation_id),
    }
}

fn finish_failed(task: CrawlTask, kind: FailureKind, trace: Vec<ConsensusResult>) -> CrawlOutcome {
    CrawlOutcome {
        status: CrawlStatus::Failed,
        fields: None,
        quality: None,
        uc_path: task.attempt_log,
        consensus_trace: trace,
        failure: Some(kind),
        escalation_id: None,
    }
}
