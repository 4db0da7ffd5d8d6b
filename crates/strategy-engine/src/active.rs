use adaptive_core_types::ExecutionId;
use dashmap::DashMap;
use tracing::debug;

use crate::model::{SettingsPatch, StrategySettings};

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveBinding {
    /// `None` when the binding was created by an adjustment without activation.
    pub strategy_id: Option<String>,
    pub settings: StrategySettings,
    /// Every adjustment merged into `settings` since binding; later fields win.
    pub applied: SettingsPatch,
}

/// Mutable per-execution copies of strategy settings.
#[derive(Default)]
pub struct ActiveStrategyManager {
    bindings: DashMap<ExecutionId, ActiveBinding>,
}

impl ActiveStrategyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, execution_id: &ExecutionId, strategy_id: &str, settings: StrategySettings) {
        debug!(execution = %execution_id, strategy = strategy_id, "binding strategy");
        self.bindings.insert(
            execution_id.clone(),
            ActiveBinding {
                strategy_id: Some(strategy_id.to_string()),
                settings,
                applied: SettingsPatch::default(),
            },
        );
    }

    /// Bound settings, or the baseline when nothing is bound.
    pub fn settings(&self, execution_id: &ExecutionId) -> StrategySettings {
        self.bindings
            .get(execution_id)
            .map(|binding| binding.settings.clone())
            .unwrap_or_default()
    }

    pub fn binding(&self, execution_id: &ExecutionId) -> Option<ActiveBinding> {
        self.bindings.get(execution_id).map(|entry| entry.value().clone())
    }

    pub fn strategy_id(&self, execution_id: &ExecutionId) -> Option<String> {
        self.bindings
            .get(execution_id)
            .and_then(|binding| binding.strategy_id.clone())
    }

    /// Merge `patch` in place; an unbound execution starts from the baseline.
    pub fn adjust(&self, execution_id: &ExecutionId, patch: &SettingsPatch) -> StrategySettings {
        let mut entry = self
            .bindings
            .entry(execution_id.clone())
            .or_insert_with(|| ActiveBinding {
                strategy_id: None,
                settings: StrategySettings::default(),
                applied: SettingsPatch::default(),
            });
        apply(execution_id, &mut entry, patch);
        entry.settings.clone()
    }

    /// Like [`adjust`](Self::adjust) but never creates a binding; `None` when
    /// the execution is not (or no longer) bound.
    pub fn adjust_bound(
        &self,
        execution_id: &ExecutionId,
        patch: &SettingsPatch,
    ) -> Option<StrategySettings> {
        let mut entry = self.bindings.get_mut(execution_id)?;
        apply(execution_id, &mut entry, patch);
        Some(entry.settings.clone())
    }

    pub fn remove(&self, execution_id: &ExecutionId) -> bool {
        self.bindings.remove(execution_id).is_some()
    }

    pub fn clear(&self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn apply(execution_id: &ExecutionId, binding: &mut ActiveBinding, patch: &SettingsPatch) {
    patch.apply_to(&mut binding.settings);
    binding.applied.merge(patch);
    debug!(
        execution = %execution_id,
        fields = ?patch.changed_fields(),
        "active settings adjusted"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClickMethod, ScrollMode};

    #[test]
    fn unbound_execution_gets_baseline() {
        let manager = ActiveStrategyManager::new();
        assert_eq!(manager.settings(&ExecutionId::from("x")), StrategySettings::default());
        assert!(manager.strategy_id(&ExecutionId::from("x")).is_none());
    }

    #[test]
    fn adjust_touches_only_given_fields() {
        let manager = ActiveStrategyManager::new();
        let id = ExecutionId::from("exec");
        let mut settings = StrategySettings::default();
        settings.max_retries = 7;
        manager.bind(&id, "custom", settings);

        let patch = SettingsPatch {
            click_method: Some(ClickMethod::Coordinates),
            ..Default::default()
        };
        let adjusted = manager.adjust(&id, &patch);
        assert_eq!(adjusted.click_method, ClickMethod::Coordinates);
        assert_eq!(adjusted.max_retries, 7);
        assert_eq!(manager.strategy_id(&id).as_deref(), Some("custom"));
    }

    #[test]
    fn adjust_without_binding_starts_from_baseline() {
        let manager = ActiveStrategyManager::new();
        let id = ExecutionId::from("exec");
        let patch = SettingsPatch {
            timeout_ms: Some(1),
            ..Default::default()
        };
        manager.adjust(&id, &patch);
        let binding = manager.binding(&id).expect("bound");
        assert_eq!(binding.strategy_id, None);
        assert_eq!(binding.settings.timeout_ms, 1);
        assert_eq!(binding.settings.max_retries, StrategySettings::default().max_retries);
    }

    #[test]
    fn adjust_bound_never_creates_bindings() {
        let manager = ActiveStrategyManager::new();
        let id = ExecutionId::from("exec");
        let patch = SettingsPatch {
            max_retries: Some(5),
            ..Default::default()
        };
        assert!(manager.adjust_bound(&id, &patch).is_none());
        assert!(manager.binding(&id).is_none());

        manager.bind(&id, "s", StrategySettings::default());
        assert_eq!(manager.adjust_bound(&id, &patch).map(|s| s.max_retries), Some(5));

        manager.remove(&id);
        assert!(manager.adjust_bound(&id, &patch).is_none());
        assert!(manager.is_empty());
    }

    #[test]
    fn applied_adjustments_accumulate() {
        let manager = ActiveStrategyManager::new();
        let id = ExecutionId::from("exec");
        manager.bind(&id, "s", StrategySettings::default());
        manager.adjust(
            &id,
            &SettingsPatch {
                timeout_ms: Some(40_000),
                scroll: Some(ScrollMode::Off),
                ..Default::default()
            },
        );
        manager.adjust(
            &id,
            &SettingsPatch {
                timeout_ms: Some(50_000),
                ..Default::default()
            },
        );
        let applied = manager.binding(&id).expect("bound").applied;
        assert_eq!(applied.timeout_ms, Some(50_000));
        assert_eq!(applied.scroll, Some(ScrollMode::Off));
        assert_eq!(applied.changed_fields(), vec!["scroll", "timeout_ms"]);
    }

    #[test]
    fn bindings_are_independent_copies() {
        let manager = ActiveStrategyManager::new();
        let a = ExecutionId::from("a");
        let b = ExecutionId::from("b");
        manager.bind(&a, "s", StrategySettings::default());
        manager.bind(&b, "s", StrategySettings::default());
        manager.adjust(
            &a,
            &SettingsPatch {
                max_retries: Some(9),
                ..Default::default()
            },
        );
        assert_eq!(manager.settings(&b).max_retries, 2);
        assert!(manager.remove(&a));
        assert_eq!(manager.len(), 1);
    }
}
