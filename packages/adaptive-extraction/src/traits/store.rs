//! Storage interface for recipes and escalations.
//!
//! The store is the only resource shared between concurrently running
//! tasks. Recipe writes are last-writer-wins: an accepted repair simply
//! overwrites, so concurrent repair of the same site is tolerated without
//! extra serialization.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::escalation::{EscalationOutcome, EscalationRecord};
use crate::types::recipe::SelectorSet;

/// Persistent storage for selector sets and escalation records.
///
/// Engine internals are out of scope here; implementations range from the
/// in-tree [`MemoryStore`](crate::stores::MemoryStore) to whatever database
/// the embedding application brings.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Get the active selector set for a site, if one exists.
    async fn get_selector_set(&self, site_id: &str) -> StoreResult<Option<SelectorSet>>;

    /// Insert or overwrite the selector set for its site.
    ///
    /// Must be atomic: readers see either the previous value or the new
    /// one, never a mix.
    async fn upsert_selector_set(&self, set: &SelectorSet) -> StoreResult<()>;

    /// Append an escalation record. Records are never deleted
    /// automatically.
    async fn append_escalation(&self, record: &EscalationRecord) -> StoreResult<()>;

    /// Mark an escalation resolved with a review outcome.
    async fn resolve_escalation(&self, id: Uuid, outcome: EscalationOutcome) -> StoreResult<()>;

    /// All unresolved escalation records, oldest first.
    async fn pending_escalations(&self) -> StoreResult<Vec<EscalationRecord>>;
}

/// Approve a pending escalation.
///
/// The review surface that collects the decision is external; the core
/// only forwards it to the store.
pub async fn approve_escalation<S: RecipeStore + ?Sized>(store: &S, id: Uuid) -> StoreResult<()> {
    store
        .resolve_escalation(id, EscalationOutcome::Approved)
        .await
}

/// Reject a pending escalation.
pub async fn reject_escalation<S: RecipeStore + ?Sized>(store: &S, id: Uuid) -> StoreResult<()> {
    store
        .resolve_escalation(id, EscalationOutcome::Rejected)
        .await
}
