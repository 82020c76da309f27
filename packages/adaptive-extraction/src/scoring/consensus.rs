//! The consensus engine.
//!
//! Pure arithmetic over already-gathered signals: no side effects, no
//! network access, which is what makes it unit-testable in isolation from
//! any AI provider. The weight on measured extraction quality is what
//! stops a confidently-wrong proposer/validator pair from passing on
//! self-reported trust alone.

use crate::types::config::ConsensusWeights;
use crate::types::consensus::{ConsensusBreakdown, ConsensusResult};

/// Combine the three signals into an accept/reject decision.
///
/// `score = w_p * proposer + w_v * validator + w_e * extraction`, accepted
/// when the score reaches `threshold`. Inputs are clamped to [0.0, 1.0]
/// first; agents self-report their confidence and are not trusted to stay
/// in range.
pub fn decide(
    proposer_confidence: f32,
    validator_confidence: f32,
    extraction_quality: f32,
    weights: &ConsensusWeights,
    threshold: f32,
) -> ConsensusResult {
    let breakdown = ConsensusBreakdown {
        proposer_contribution: weights.proposer * proposer_confidence.clamp(0.0, 1.0),
        validator_contribution: weights.validator * validator_confidence.clamp(0.0, 1.0),
        extraction_contribution: weights.extraction * extraction_quality.clamp(0.0, 1.0),
    };

    let score = breakdown.proposer_contribution
        + breakdown.validator_contribution
        + breakdown.extraction_contribution;

    ConsensusResult {
        score,
        accepted: score >= threshold,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn defaults() -> ConsensusWeights {
        ConsensusWeights::default()
    }

    #[test]
    fn test_confident_but_wrong_is_rejected() {
        // High agent confidence must never pass consensus when the
        // selectors demonstrably extract nothing.
        let result = decide(0.9, 0.9, 0.0, &defaults(), 0.6);
        assert!(!result.accepted);
        assert!((result.score - 0.54).abs() < 1e-6);
    }

    #[test]
    fn test_confident_and_right_is_accepted() {
        let result = decide(0.9, 0.9, 1.0, &defaults(), 0.6);
        assert!(result.accepted);
        assert!((result.score - 0.94).abs() < 1e-6);
    }

    #[test]
    fn test_breakdown_sums_to_score() {
        let result = decide(0.7, 0.5, 0.8, &defaults(), 0.6);
        let sum = result.breakdown.proposer_contribution
            + result.breakdown.validator_contribution
            + result.breakdown.extraction_contribution;
        assert!((result.score - sum).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let result = decide(7.0, -3.0, 2.0, &defaults(), 0.6);
        assert!((result.score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let result = decide(1.0, 1.0, 1.0, &defaults(), 1.0);
        assert!(result.accepted);
    }

    proptest! {
        #[test]
        fn prop_score_stays_in_unit_range(
            p in -2.0f32..2.0,
            v in -2.0f32..2.0,
            e in -2.0f32..2.0,
        ) {
            let result = decide(p, v, e, &defaults(), 0.6);
            prop_assert!(result.score >= 0.0);
            prop_assert!(result.score <= 1.0 + 1e-6);
        }

        #[test]
        fn prop_score_is_monotone_in_each_input(
            p in 0.0f32..1.0,
            v in 0.0f32..1.0,
            e in 0.0f32..1.0,
            bump in 0.01f32..0.5,
        ) {
            let weights = defaults();
            let base = decide(p, v, e, &weights, 0.6).score;
            prop_assert!(decide((p + bump).min(1.0), v, e, &weights, 0.6).score >= base);
            prop_assert!(decide(p, (v + bump).min(1.0), e, &weights, 0.6).score >= base);
            prop_assert!(decide(p, v, (e + bump).min(1.0), &weights, 0.6).score >= base);
        }
    }
}
