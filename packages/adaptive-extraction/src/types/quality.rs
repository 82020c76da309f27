//! The quality score produced by the gate rubric.

use serde::{Deserialize, Serialize};

/// Deterministic rubric score over extracted fields, 0 to 100.
///
/// Recomputed every time the quality gate runs; logged for operators but
/// never persisted as authoritative truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Points awarded for the title field
    pub title_points: u8,

    /// Points awarded for the body field
    pub body_points: u8,

    /// Points awarded for the publication date field
    pub date_points: u8,

    /// Points awarded for the URL
    pub url_points: u8,

    /// Sum of the field points, 0 to 100
    pub total: u8,
}

impl QualityScore {
    /// Assemble a score from field points.
    pub fn new(title_points: u8, body_points: u8, date_points: u8, url_points: u8) -> Self {
        Self {
            title_points,
            body_points,
            date_points,
            url_points,
            total: title_points + body_points + date_points + url_points,
        }
    }

    /// The same signal on the 0.0 to 1.0 range, as fed to the consensus
    /// engine.
    pub fn normalized(&self) -> f32 {
        f32::from(self.total) / 100.0
    }

    /// Whether the score clears a pass threshold (0 to 100).
    pub fn passes(&self, threshold: u8) -> bool {
        self.total >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_of_fields() {
        let score = QualityScore::new(30, 40, 15, 15);
        assert_eq!(score.total, 100);
        assert!((score.normalized() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_passes_threshold() {
        let score = QualityScore::new(30, 40, 0, 15);
        assert!(score.passes(80));
        assert!(!score.passes(90));
    }
}
