use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::builtin::builtin_strategies;
use crate::errors::{EngineError, Result};
use crate::model::Strategy;

#[derive(Default)]
struct RegistryInner {
    order: Vec<String>,
    by_id: HashMap<String, Strategy>,
}

/// Insertion-ordered catalog of strategy templates.
pub struct StrategyRegistry {
    inner: RwLock<RegistryInner>,
}

impl StrategyRegistry {
    /// Registry seeded with the built-in strategies.
    pub fn new() -> Self {
        let registry = Self::empty();
        for strategy in builtin_strategies() {
            registry.insert(strategy);
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Store or replace a strategy. A replaced id keeps its original position.
    pub fn register(&self, strategy: Strategy) -> Result<()> {
        validate(&strategy)?;
        debug!(strategy = %strategy.id, "registering strategy");
        self.insert(strategy);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Strategy> {
        self.inner.read().by_id.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().by_id.contains_key(id)
    }

    /// All strategies in insertion order.
    pub fn list(&self) -> Vec<Strategy> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, strategy: Strategy) {
        let mut inner = self.inner.write();
        if !inner.by_id.contains_key(&strategy.id) {
            inner.order.push(strategy.id.clone());
        }
        inner.by_id.insert(strategy.id.clone(), strategy);
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(strategy: &Strategy) -> Result<()> {
    if strategy.id.trim().is_empty() {
        return Err(EngineError::invalid(&strategy.id, "id must not be empty"));
    }
    if strategy.page_types.is_empty() {
        return Err(EngineError::invalid(
            &strategy.id,
            "at least one page type is required",
        ));
    }
    if strategy.complexities.is_empty() {
        return Err(EngineError::invalid(
            &strategy.id,
            "at least one complexity is required",
        ));
    }
    Ok(())
}
