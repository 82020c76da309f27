//! Self-Healing Content Extraction
//!
//! A selector-recipe extraction orchestrator that repairs itself: given a
//! URL, it extracts structured fields (title, body, publication date)
//! using the stored recipe for that site, and when extraction quality
//! degrades, or no recipe exists yet, it repairs or creates the recipe
//! using independent proposer/validator agents reconciled through a
//! weighted-consensus decision.
//!
//! # Design Philosophy
//!
//! **"Trust is earned by extraction, not asserted by agents"**
//!
//! - Measured extraction quality outweighs self-reported confidence
//! - Absence of content is a scoreable value, never an exception
//! - Every failure path ends in a terminal outcome or an escalation
//!   record; no crashes, no lost tasks
//! - Pure transition functions plus a driver loop, not a mutable blob
//!   threaded through the machine
//! - Capabilities are small traits with ordered fallback chains, so
//!   providers are swappable and tests run without a network
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use adaptive_extraction::{MemoryStore, Supervisor};
//! use adaptive_extraction::fetch::HttpFetcher;
//!
//! let supervisor = Supervisor::new(
//!     MemoryStore::new(),
//!     HttpFetcher::new(),
//!     vec![Arc::new(my_proposer)],
//!     vec![Arc::new(my_validator)],
//! )?;
//!
//! let outcome = supervisor.handle("https://example.com/news/1", "example.com").await?;
//! println!("{:?} via {:?}", outcome.status, outcome.uc_path);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Proposer, RecipeValidator,
//!   PageFetcher, RecipeStore, RouteVoter)
//! - [`types`] - Tasks, recipes, consensus values, escalations, config
//! - [`scoring`] - The quality rubric and the consensus engine
//! - [`extract`] - Applying selector sets to live HTML
//! - [`session`] - Repair/discovery consensus loops and provider fallback
//! - [`supervisor`] - The state machine driving every task
//! - [`stores`] - Storage implementations (MemoryStore)
//! - [`fetch`] - HTTP-backed page fetcher
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod extract;
pub mod fetch;
pub mod scoring;
pub mod session;
pub mod stores;
pub mod supervisor;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    ConfigError, FetchError, OrchestratorError, ProviderError, Result, StoreError,
};
pub use traits::{
    approve_escalation, reject_escalation, FetchedPage, PageFetcher, Proposer, ProviderIdentity,
    RecipeStore, RecipeValidator, RouteQuestion, RouteVoter,
};
pub use types::{
    site_fingerprint, ConsensusBreakdown, ConsensusResult, ConsensusWeights, CrawlOutcome,
    CrawlStatus, CrawlTask, EscalationKind, EscalationOutcome, EscalationRecord, FailureKind,
    Proposal, QualityRubric, QualityScore, RoutingStrategy, SelectorSet, SiteKind,
    SupervisorConfig, UcState, Validation,
};

// Re-export the orchestration pieces
pub use extract::{apply, apply_scored, ExtractedFields};
pub use scoring::{decide, score_fields};
pub use session::{ConsensusSession, ProviderChain, SessionMode, SessionOutcome};
pub use supervisor::{RouteEvent, Supervisor};

// Re-export stores
pub use stores::MemoryStore;

// Re-export the default fetcher
pub use fetch::HttpFetcher;
