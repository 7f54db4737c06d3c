//! Run-scoped identity registry.
//!
//! The set of every node id materialized so far in one import run. Entity
//! transforms populate it; relationship transforms read it to enforce that
//! an edge's source endpoint exists. Its lifetime is one run: a fresh
//! import starts empty because the schema lifecycle has already wiped the
//! target, so it is owned by the pipeline and passed by reference, never
//! held in process-global state.

use rustc_hash::FxHashSet;

#[derive(Debug, Default)]
pub struct IdentityRegistry {
    ids: FxHashSet<String>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already registered. Double-adding is not
    /// an error in itself, but across entity tables it signals a modeling
    /// bug upstream.
    pub fn insert(&mut self, id: String) -> bool {
        self.ids.insert(id)
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = String>) {
        self.ids.extend(ids);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
