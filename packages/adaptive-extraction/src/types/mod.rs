//! Core data types: recipes, tasks, consensus values, escalations,
//! quality scores, and configuration.

pub mod config;
pub mod consensus;
pub mod escalation;
pub mod quality;
pub mod recipe;
pub mod task;

pub use config::{ConsensusWeights, QualityRubric, RoutingStrategy, SupervisorConfig};
pub use consensus::{ConsensusBreakdown, ConsensusResult, Proposal, Validation};
pub use escalation::{EscalationKind, EscalationOutcome, EscalationRecord};
pub use quality::QualityScore;
pub use recipe::{site_fingerprint, SelectorSet, SiteKind};
pub use task::{CrawlOutcome, CrawlStatus, CrawlTask, FailureKind, UcState};
