// Copyright 2025 Cowboy AI, LLC.

//! Registry of loaded categorizations
//!
//! Cross-scheme search needs a set of loaded categorizations. The registry
//! is an ordinary value: create one, register schemes, query, drop it.
//! Independent registries can coexist in one process.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::categorization::Categorization;
use crate::category::Category;
use crate::errors::{CategorizationError, CategorizationResult};

/// A category found by a cross-scheme search
#[derive(Debug, Clone, PartialEq)]
pub struct CodeMatch {
    /// The scheme containing the category
    pub categorization: Arc<Categorization>,
    /// The matching category
    pub category: Arc<Category>,
}

/// Named set of categorizations
#[derive(Debug, Clone, Default)]
pub struct CategorizationRegistry {
    categorizations: IndexMap<String, Arc<Categorization>>,
}

impl CategorizationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a categorization under its name
    pub fn register(
        &mut self,
        categorization: impl Into<Arc<Categorization>>,
    ) -> CategorizationResult<Arc<Categorization>> {
        let categorization = categorization.into();
        let name = categorization.name().to_string();
        if self.categorizations.contains_key(&name) {
            return Err(CategorizationError::AlreadyRegistered(name));
        }

        info!(categorization = %name, categories = categorization.len(), "registered categorization");
        self.categorizations.insert(name, Arc::clone(&categorization));
        Ok(categorization)
    }

    /// Remove a categorization, returning it if it was registered
    pub fn unregister(&mut self, name: &str) -> Option<Arc<Categorization>> {
        let removed = self.categorizations.shift_remove(name);
        if removed.is_some() {
            info!(categorization = %name, "unregistered categorization");
        }
        removed
    }

    /// Drop every registered categorization
    pub fn clear(&mut self) {
        debug!(count = self.categorizations.len(), "clearing registry");
        self.categorizations.clear();
    }

    /// Get a categorization by name
    pub fn get(&self, name: &str) -> Option<&Arc<Categorization>> {
        self.categorizations.get(name)
    }

    /// Get a categorization by name, failing if it is missing
    pub fn lookup(&self, name: &str) -> CategorizationResult<&Arc<Categorization>> {
        self.get(name)
            .ok_or_else(|| CategorizationError::CategorizationNotFound(name.to_string()))
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.categorizations.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categorizations.keys().map(String::as_str)
    }

    /// Registered categorizations in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Categorization>> {
        self.categorizations.values()
    }

    /// Number of registered categorizations
    pub fn len(&self) -> usize {
        self.categorizations.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.categorizations.is_empty()
    }

    /// Find every category in every registered scheme matching `code`.
    ///
    /// An unknown code yields an empty result, not an error.
    pub fn find_code(&self, code: &str) -> Vec<CodeMatch> {
        let matches: Vec<CodeMatch> = self
            .categorizations
            .values()
            .filter_map(|categorization| {
                categorization.get(code).map(|category| CodeMatch {
                    categorization: Arc::clone(categorization),
                    category: Arc::clone(category),
                })
            })
            .collect();

        debug!(code, matches = matches.len(), "searched registered categorizations");
        matches
    }
}
