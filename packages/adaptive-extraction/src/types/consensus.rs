//! Proposals, validations, and consensus decisions.
//!
//! These are the ephemeral per-round values of a repair or discovery
//! session: a proposer suggests a candidate recipe, a validator
//! independently assesses it, and the consensus engine folds both
//! self-reported confidences together with the measured extraction quality
//! into one accept/reject decision.

use serde::{Deserialize, Serialize};

use crate::types::recipe::SelectorSet;

/// A candidate recipe suggested by a proposer agent.
///
/// Produced once per consensus round and discarded with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// The suggested selector set
    pub candidate: SelectorSet,

    /// The proposer's self-reported confidence (0.0 to 1.0)
    pub proposer_confidence: f32,

    /// Why the proposer chose these selectors
    pub rationale: String,

    /// Identity of the provider that produced this proposal
    pub provider: String,
}

impl Proposal {
    /// Create a proposal.
    pub fn new(
        candidate: SelectorSet,
        proposer_confidence: f32,
        rationale: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            candidate,
            proposer_confidence,
            rationale: rationale.into(),
            provider: provider.into(),
        }
    }
}

/// A validator agent's independent assessment of a proposal.
///
/// Paired 1:1 with the [`Proposal`] of the same round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the candidate looks plausible for the page
    pub is_plausible: bool,

    /// The validator's self-reported confidence (0.0 to 1.0)
    pub validator_confidence: f32,

    /// Free-form feedback, handed back to proposers on retry
    pub feedback: String,

    /// Identity of the provider that produced this validation
    pub provider: String,
}

impl Validation {
    /// Create a validation.
    pub fn new(
        is_plausible: bool,
        validator_confidence: f32,
        feedback: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            is_plausible,
            validator_confidence,
            feedback: feedback.into(),
            provider: provider.into(),
        }
    }
}

/// Per-signal contributions to a consensus score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusBreakdown {
    /// `weight_proposer * proposer_confidence`
    pub proposer_contribution: f32,

    /// `weight_validator * validator_confidence`
    pub validator_contribution: f32,

    /// `weight_extraction * extraction_quality`
    pub extraction_contribution: f32,
}

/// The accept/reject decision for one consensus round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Weighted combination of the three signals (0.0 to 1.0)
    pub score: f32,

    /// Whether the score cleared the threshold in force
    pub accepted: bool,

    /// How each signal contributed to the score
    pub breakdown: ConsensusBreakdown,
}
