//! Escalation records for unresolved repair/discovery attempts.
//!
//! An escalation is the terminal, non-crashing outcome when automated
//! repair or discovery cannot reach consensus within its retry budget, or
//! when the loop guard trips. Records are appended to the store for later
//! human action and never deleted automatically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::consensus::{Proposal, Validation};
use crate::types::task::CrawlTask;

/// Why the escalation was raised.
///
/// Kept distinct so operators can tell "kept failing validation" apart
/// from "kept bouncing between states".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationKind {
    /// All consensus retries spent without acceptance
    ConsensusExhausted,

    /// The loop guard forced escalation
    LoopGuardTripped,
}

/// Outcome of a human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationOutcome {
    Approved,
    Rejected,
}

/// One unresolved repair/discovery attempt, awaiting human action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    /// Record identity
    pub id: Uuid,

    /// The task that escalated
    pub task_id: Uuid,

    /// Site whose recipe could not be repaired or discovered
    pub site_id: String,

    /// URL the task was processing
    pub url: String,

    /// The last proposal of the failed session, if any round completed
    pub final_proposal: Option<Proposal>,

    /// The validation paired with the last proposal
    pub final_validation: Option<Validation>,

    /// Consensus-round retries consumed before giving up
    pub retries_used: u32,

    /// What forced the escalation
    pub kind: EscalationKind,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// Whether a human has acted on the record
    pub resolved: bool,

    /// The review outcome, once resolved
    pub outcome: Option<EscalationOutcome>,
}

impl EscalationRecord {
    /// Create a pending record for a task.
    pub fn new(
        task: &CrawlTask,
        kind: EscalationKind,
        final_proposal: Option<Proposal>,
        final_validation: Option<Validation>,
        retries_used: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task.id,
            site_id: task.site_id.clone(),
            url: task.url.clone(),
            final_proposal,
            final_validation,
            retries_used,
            kind,
            created_at: Utc::now(),
            resolved: false,
            outcome: None,
        }
    }

    /// Mark the record resolved with a review outcome.
    pub fn resolve(&mut self, outcome: EscalationOutcome) {
        self.resolved = true;
        self.outcome = Some(outcome);
    }
}
