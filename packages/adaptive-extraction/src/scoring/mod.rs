//! Deterministic scoring: the quality rubric and the consensus engine.

pub mod consensus;
pub mod quality;

pub use consensus::decide;
pub use quality::{parseable_date, score_fields};
