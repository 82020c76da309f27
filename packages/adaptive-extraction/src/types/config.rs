//! Configuration for the supervisor and its sessions.
//!
//! All thresholds and budgets live here as named fields rather than magic
//! literals at call sites. `SupervisorConfig::validate` runs at supervisor
//! construction; an invalid config is fatal before any task is accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Weights the consensus engine applies to its three signals.
///
/// Must be non-negative and sum to 1.0 (within 1e-6). The 0.4 default on
/// measured extraction quality is load-bearing: it is what prevents a
/// confidently-wrong proposer/validator pair from being accepted purely on
/// self-reported trust.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusWeights {
    /// Weight on the proposer's self-reported confidence. Default: 0.3.
    pub proposer: f32,

    /// Weight on the validator's self-reported confidence. Default: 0.3.
    pub validator: f32,

    /// Weight on the measured extraction quality. Default: 0.4.
    pub extraction: f32,
}

impl Default for ConsensusWeights {
    fn default() -> Self {
        Self {
            proposer: 0.3,
            validator: 0.3,
            extraction: 0.4,
        }
    }
}

impl ConsensusWeights {
    /// Sum of the three weights.
    pub fn sum(&self) -> f32 {
        self.proposer + self.validator + self.extraction
    }

    /// Check non-negativity and the sum invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("proposer", self.proposer),
            ("validator", self.validator),
            ("extraction", self.extraction),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

/// Field weights and length thresholds for the quality rubric.
///
/// The field weights are policy, not hard-coded physics, but must sum
/// to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRubric {
    /// Points for a usable title. Default: 30.
    pub title_weight: u8,

    /// Points for a usable body. Default: 40.
    pub body_weight: u8,

    /// Points for a parseable date. Default: 15.
    pub date_weight: u8,

    /// Points for a well-formed URL. Default: 15.
    pub url_weight: u8,

    /// Minimum title length (chars) for full title credit. Default: 10.
    pub min_title_len: usize,

    /// Body length (chars) above which the body earns full credit.
    /// Default: 500.
    pub body_full_len: usize,

    /// Body length (chars) above which the body earns at least half
    /// credit, graduating linearly up to full. Shorter non-empty bodies
    /// earn proportionally less. Graduated rather than binary, so legitimately
    /// short articles are not punished. Default: 120.
    pub body_partial_len: usize,
}

impl Default for QualityRubric {
    fn default() -> Self {
        Self {
            title_weight: 30,
            body_weight: 40,
            date_weight: 15,
            url_weight: 15,
            min_title_len: 10,
            body_full_len: 500,
            body_partial_len: 120,
        }
    }
}

impl QualityRubric {
    /// Sum of the field weights.
    pub fn weight_sum(&self) -> u32 {
        u32::from(self.title_weight)
            + u32::from(self.body_weight)
            + u32::from(self.date_weight)
            + u32::from(self.url_weight)
    }

    /// Check the sum-to-100 invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.weight_sum();
        if sum != 100 {
            return Err(ConfigError::RubricSum { sum });
        }
        Ok(())
    }
}

/// How the supervisor picks the next state when leaving the gate with a
/// failing recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// Deterministic rule table. Zero added latency, zero added risk.
    RuleTable,

    /// Fan the routing question out to independent voter agents and take
    /// the modal answer; falls back to the rule table on a tie or on too
    /// few responders.
    MajorityVote,
}

/// All supervisor knobs in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Quality-gate pass threshold, 0 to 100. Default: 80.
    pub pass_threshold: u8,

    /// Quality rubric weights and thresholds.
    pub rubric: QualityRubric,

    /// Consensus signal weights.
    pub weights: ConsensusWeights,

    /// Consensus acceptance threshold for repair sessions (0.0 to 1.0).
    /// Default: 0.6.
    pub repair_threshold: f32,

    /// Consensus acceptance threshold for discovery sessions (0.0 to 1.0).
    /// Default: 0.6. Kept separate from the repair threshold so the two
    /// can be tuned independently.
    pub discovery_threshold: f32,

    /// Consensus rounds a session may spend before escalating. Default: 3.
    pub max_consensus_retries: u32,

    /// Visits to any one state before the loop guard forces escalation.
    /// Default: 3.
    pub max_loop_repeats: u32,

    /// Hard per-call timeout on provider calls, distinct from any
    /// provider-side timeout. Default: 30s.
    pub call_timeout: Duration,

    /// Attempts per provider before falling to the next in the chain.
    /// Default: 3.
    pub provider_retries: u32,

    /// First backoff delay between attempts on one provider; doubles each
    /// attempt. Default: 200ms.
    pub backoff_base: Duration,

    /// Upper bound on the backoff delay. Default: 5s.
    pub backoff_cap: Duration,

    /// Routing strategy when leaving the gate. Default: rule table.
    pub routing: RoutingStrategy,

    /// Shared deadline for the majority-vote fan-out. Default: 10s.
    pub vote_deadline: Duration,

    /// Minimum voters that must answer before the vote counts.
    /// Default: 2.
    pub min_responders: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 80,
            rubric: QualityRubric::default(),
            weights: ConsensusWeights::default(),
            repair_threshold: 0.6,
            discovery_threshold: 0.6,
            max_consensus_retries: 3,
            max_loop_repeats: 3,
            call_timeout: Duration::from_secs(30),
            provider_retries: 3,
            backoff_base: Duration::from_millis(200),
            backoff_cap: Duration::from_secs(5),
            routing: RoutingStrategy::RuleTable,
            vote_deadline: Duration::from_secs(10),
            min_responders: 2,
        }
    }
}

impl SupervisorConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quality-gate pass threshold.
    pub fn with_pass_threshold(mut self, threshold: u8) -> Self {
        self.pass_threshold = threshold;
        self
    }

    /// Set the consensus weights.
    pub fn with_weights(mut self, weights: ConsensusWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set both consensus thresholds at once.
    pub fn with_consensus_threshold(mut self, threshold: f32) -> Self {
        self.repair_threshold = threshold;
        self.discovery_threshold = threshold;
        self
    }

    /// Set the consensus retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_consensus_retries = retries;
        self
    }

    /// Set the loop-repeat budget.
    pub fn with_max_loop_repeats(mut self, repeats: u32) -> Self {
        self.max_loop_repeats = repeats;
        self
    }

    /// Set the per-call provider timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the routing strategy.
    pub fn with_routing(mut self, routing: RoutingStrategy) -> Self {
        self.routing = routing;
        self
    }

    /// Set the majority-vote deadline.
    pub fn with_vote_deadline(mut self, deadline: Duration) -> Self {
        self.vote_deadline = deadline;
        self
    }

    /// Check every startup invariant.
    ///
    /// Violations are configuration errors, not runtime decisions: the
    /// supervisor constructor refuses to produce an instance from an
    /// invalid config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.rubric.validate()?;

        for (name, value) in [
            ("repair_threshold", self.repair_threshold),
            ("discovery_threshold", self.discovery_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdRange { name, value });
            }
        }

        if self.pass_threshold > 100 {
            return Err(ConfigError::ThresholdRange {
                name: "pass_threshold",
                value: f32::from(self.pass_threshold),
            });
        }

        for (name, value) in [
            ("max_consensus_retries", self.max_consensus_retries),
            ("max_loop_repeats", self.max_loop_repeats),
            ("provider_retries", self.provider_retries),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroBudget { name });
            }
        }

        if self.min_responders == 0 {
            return Err(ConfigError::ZeroBudget {
                name: "min_responders",
            });
        }

        Ok(())
    }
}
