//! User-defined symbol collection.
//!
//! Every mutation builds a new collection and swaps it in, so a snapshot
//! taken earlier keeps seeing the collection as it was.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{catalog, Symbol, SymbolDraft, SymbolPatch};

#[derive(Debug, Clone, Default)]
pub struct UserSymbolStore {
    symbols: Arc<Vec<Symbol>>,
}

impl UserSymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads drafts through [`UserSymbolStore::add`], so incomplete drafts are skipped.
    pub fn from_drafts(drafts: impl IntoIterator<Item = SymbolDraft>) -> Self {
        let mut store = Self::new();
        for draft in drafts {
            store.add(draft);
        }
        store
    }

    /// Current collection. Later mutations do not affect the returned value.
    pub fn snapshot(&self) -> Arc<Vec<Symbol>> {
        Arc::clone(&self.symbols)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Adds a symbol. A draft with a blank name or code is ignored.
    pub fn add(&mut self, draft: SymbolDraft) -> Option<&Symbol> {
        let name = draft.name.trim();
        let code = draft.code.trim();
        if name.is_empty() || code.is_empty() {
            debug!("Ignoring symbol draft without name or code");
            return None;
        }

        let symbol = Symbol {
            id: self.next_id(),
            name: name.to_string(),
            code: code.to_string(),
            category: draft.category,
            description: draft.description,
            customizable: true,
        };

        let mut next = Vec::with_capacity(self.symbols.len() + 1);
        next.extend(self.symbols.iter().cloned());
        next.push(symbol);
        self.symbols = Arc::new(next);

        self.symbols.last()
    }

    /// Removes a symbol by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }

        let next: Vec<Symbol> = self.symbols.iter().filter(|s| s.id != id).cloned().collect();
        self.symbols = Arc::new(next);
        true
    }

    /// Applies a patch to the symbol with the given id.
    pub fn update(&mut self, id: &str, patch: &SymbolPatch) -> Option<&Symbol> {
        let index = self.symbols.iter().position(|s| s.id == id)?;

        let mut next: Vec<Symbol> = self.symbols.as_ref().clone();
        patch.apply_to(&mut next[index]);
        self.symbols = Arc::new(next);

        self.symbols.get(index)
    }

    /// Built-in catalog followed by the user symbols.
    pub fn combined_with_catalog(&self) -> Vec<Symbol> {
        catalog::all()
            .iter()
            .chain(self.symbols.iter())
            .cloned()
            .collect()
    }

    fn next_id(&self) -> String {
        let base = format!("custom_{}", Utc::now().timestamp_millis());
        if self.get(&base).is_none() {
            return base;
        }

        (1..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or(base)
    }
}
