//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::RecipeStore;
use crate::types::escalation::{EscalationOutcome, EscalationRecord};
use crate::types::recipe::SelectorSet;

/// In-memory store for selector sets and escalation records.
///
/// Useful for testing and development. Not suitable for production as
/// data is lost on restart. The upsert is a single map insert under the
/// write lock, so readers observe either the previous recipe or the new
/// one. Last-writer-wins, never a mix.
pub struct MemoryStore {
    recipes: RwLock<HashMap<String, SelectorSet>>,
    escalations: RwLock<Vec<EscalationRecord>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            recipes: RwLock::new(HashMap::new()),
            escalations: RwLock::new(Vec::new()),
        }
    }

    /// Create a store preloaded with recipes.
    pub fn with_recipes(recipes: impl IntoIterator<Item = SelectorSet>) -> Self {
        let store = Self::new();
        {
            let mut map = store.recipes.write().unwrap();
            for recipe in recipes {
                map.insert(recipe.site_id.clone(), recipe);
            }
        }
        store
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.recipes.write().unwrap().clear();
        self.escalations.write().unwrap().clear();
    }

    /// Number of stored recipes.
    pub fn recipe_count(&self) -> usize {
        self.recipes.read().unwrap().len()
    }

    /// Number of escalation records, resolved or not.
    pub fn escalation_count(&self) -> usize {
        self.escalations.read().unwrap().len()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn get_selector_set(&self, site_id: &str) -> StoreResult<Option<SelectorSet>> {
        Ok(self.recipes.read().unwrap().get(site_id).cloned())
    }

    async fn upsert_selector_set(&self, set: &SelectorSet) -> StoreResult<()> {
        self.recipes
            .write()
            .unwrap()
            .insert(set.site_id.clone(), set.clone());
        Ok(())
    }

    async fn append_escalation(&self, record: &EscalationRecord) -> StoreResult<()> {
        self.escalations.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn resolve_escalation(&self, id: Uuid, outcome: EscalationOutcome) -> StoreResult<()> {
        let mut escalations = self.escalations.write().unwrap();
        match escalations.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.resolve(outcome);
                Ok(())
            }
            None => Err(StoreError::EscalationNotFound { id }),
        }
    }

    async fn pending_escalations(&self) -> StoreResult<Vec<EscalationRecord>> {
        Ok(self
            .escalations
            .read()
            .unwrap()
            .iter()
            .filter(|r| !r.resolved)
            .cloned()
            .collect())
    }
}
