//! Crawl tasks, state names, and task outcomes.
//!
//! A [`CrawlTask`] is created per incoming URL, mutated only by supervisor
//! transitions, and destroyed when the task reaches a terminal state. The
//! supervisor owns it exclusively for the task's lifetime.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::consensus::ConsensusResult;
use crate::types::quality::QualityScore;
use crate::types::recipe::SelectorSet;

/// Supervisor state names.
///
/// `Gate`, `Repair`, `Discover`, and `Escalate` are the working states
/// recorded in a task's attempt log; `Init` and the two `Done*` states are
/// bookkeeping ends of the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UcState {
    Init,
    Gate,
    Repair,
    Discover,
    Escalate,
    DoneOk,
    DoneFail,
}

impl UcState {
    /// Canonical state name, as recorded in logs and outcomes.
    pub fn name(&self) -> &'static str {
        match self {
            UcState::Init => "INIT",
            UcState::Gate => "GATE",
            UcState::Repair => "REPAIR",
            UcState::Discover => "DISCOVER",
            UcState::Escalate => "ESCALATE",
            UcState::DoneOk => "DONE_OK",
            UcState::DoneFail => "DONE_FAIL",
        }
    }

    /// Whether the state ends the traversal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UcState::DoneOk | UcState::DoneFail)
    }
}

impl fmt::Display for UcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-URL unit of work, owned by the supervisor.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// Task identity
    pub id: Uuid,

    /// The URL being extracted
    pub url: String,

    /// Normalized site identity keying the stored recipe
    pub site_id: String,

    /// The stored recipe as read at the last gate entry, if any.
    ///
    /// Kept on the task so a repair session can hand the failing recipe to
    /// proposers as negative context.
    pub recipe_snapshot: Option<SelectorSet>,

    /// Ordered sequence of working states the task has visited
    pub attempt_log: Vec<UcState>,

    /// Quality-gate failures seen by this task
    pub failure_count: u32,

    /// Total visits per state, for the loop guard
    pub loop_counts: HashMap<UcState, u32>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

impl CrawlTask {
    /// Create a task for a URL.
    pub fn new(url: impl Into<String>, site_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            site_id: site_id.into(),
            recipe_snapshot: None,
            attempt_log: Vec::new(),
            failure_count: 0,
            loop_counts: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Record a visit to a working state.
    ///
    /// Returns the total number of visits to that state including this one,
    /// which the supervisor compares against the loop-repeat budget.
    pub fn record_visit(&mut self, state: UcState) -> u32 {
        self.attempt_log.push(state);
        let count = self.loop_counts.entry(state).or_insert(0);
        *count += 1;
        *count
    }
}

/// Terminal status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    /// Extraction passed the quality gate
    Success,

    /// Automated repair/discovery could not reach consensus; an escalation
    /// record is pending human review
    Escalated,

    /// Fetch-level failure or cancellation; retry later
    Failed,
}

/// Why a task ended without success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network/HTTP failure, nothing to extract from
    Fetch,

    /// All consensus retries spent without acceptance
    ConsensusExhausted,

    /// The loop guard forced escalation (state ping-pong)
    LoopGuardTripped,

    /// The task-level cancellation signal fired
    Cancelled,
}

/// What `handle` returns for every task, terminal in all cases.
///
/// A failed task is a value here, never a panic or a lost task: `Escalated`
/// means an escalation record awaits human review, `Failed` means the fetch
/// layer (or a cancellation) stopped the task before extraction.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Terminal status
    pub status: CrawlStatus,

    /// Extracted fields, when the gate passed
    pub fields: Option<crate::extract::ExtractedFields>,

    /// The quality score from the last gate run
    pub quality: Option<QualityScore>,

    /// Ordered working states the task traversed
    pub uc_path: Vec<UcState>,

    /// Every consensus decision made on the task's behalf
    pub consensus_trace: Vec<ConsensusResult>,

    /// Failure classification, when status is not `Success`
    pub failure: Option<FailureKind>,

    /// Escalation record id, when status is `Escalated`
    pub escalation_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_visit_counts_per_state() {
        let mut task = CrawlTask::new("https://example.com/a", "example.com");
        assert_eq!(task.record_visit(UcState::Gate), 1);
        assert_eq!(task.record_visit(UcState::Repair), 1);
        assert_eq!(task.record_visit(UcState::Gate), 2);
        assert_eq!(
            task.attempt_log,
            vec![UcState::Gate, UcState::Repair, UcState::Gate]
        );
    }

    #[test]
    fn test_state_names() {
        assert_eq!(UcState::Gate.name(), "GATE");
        assert_eq!(UcState::DoneFail.name(), "DONE_FAIL");
        assert!(UcState::DoneOk.is_terminal());
        assert!(!UcState::Escalate.is_terminal());
    }
}
