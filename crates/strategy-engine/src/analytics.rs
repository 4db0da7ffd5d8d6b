use std::collections::BTreeMap;

use adaptive_core_types::ExecutionId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::metrics::EngineMetricsSnapshot;
use crate::model::{AdaptationEvent, ExecutionSummary, SitePerformance, StrategyEffectiveness};

/// Point-in-time view over retained events and site records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub site_performance: Vec<SitePerformance>,
    pub strategy_effectiveness: Vec<StrategyEffectiveness>,
    pub total_events: usize,
    pub active_executions: usize,
    pub metrics: EngineMetricsSnapshot,
}

/// Adaptation events grouped by execution, capped per execution.
#[derive(Default)]
pub struct EventLog {
    events: DashMap<ExecutionId, Vec<AdaptationEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and drop the oldest events past `cap`. Returns how many were dropped.
    pub fn append(&self, event: AdaptationEvent, cap: usize) -> usize {
        let mut entry = self
            .events
            .entry(event.execution_id.clone())
            .or_insert_with(Vec::new);
        entry.push(event);
        let cap = cap.max(1);
        if entry.len() <= cap {
            return 0;
        }
        let overflow = entry.len() - cap;
        entry.drain(0..overflow);
        warn!(
            execution = %entry.key(),
            dropped = overflow,
            "adaptation history truncated"
        );
        overflow
    }

    pub fn events(&self, execution_id: &ExecutionId) -> Vec<AdaptationEvent> {
        self.events
            .get(execution_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn remove(&self, execution_id: &ExecutionId) -> bool {
        self.events.remove(execution_id).is_some()
    }

    pub fn clear(&self) {
        self.events.clear();
    }

    pub fn total(&self) -> usize {
        self.events.iter().map(|entry| entry.value().len()).sum()
    }

    /// Per-strategy usage over every retained event, sorted by strategy id.
    pub fn effectiveness(&self) -> Vec<StrategyEffectiveness> {
        #[derive(Default)]
        struct Tally {
            usage: u64,
            successes: u64,
            duration_ms: u64,
        }

        let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
        for entry in self.events.iter() {
            for event in entry.value() {
                let tally = tallies.entry(event.strategy_id.clone()).or_default();
                tally.usage += 1;
                tally.duration_ms = tally.duration_ms.saturating_add(event.duration_ms);
                if event.success {
                    tally.successes += 1;
                }
            }
        }

        tallies
            .into_iter()
            .map(|(strategy_id, tally)| StrategyEffectiveness {
                strategy_id,
                usage_count: tally.usage,
                success_count: tally.successes,
                success_rate: tally.successes as f64 / tally.usage as f64,
                average_duration_ms: tally.duration_ms as f64 / tally.usage as f64,
            })
            .collect()
    }

    pub fn summary(
        &self,
        execution_id: &ExecutionId,
        active_strategy: Option<String>,
    ) -> ExecutionSummary {
        let events = self.events(execution_id);
        let successes = events.iter().filter(|event| event.success).count();
        let mut strategies_used: Vec<String> = Vec::new();
        for event in &events {
            if !strategies_used.contains(&event.strategy_id) {
                strategies_used.push(event.strategy_id.clone());
            }
        }
        ExecutionSummary {
            execution_id: execution_id.clone(),
            events: events.len(),
            successes,
            failures: events.len() - successes,
            total_duration_ms: events.iter().map(|event| event.duration_ms).sum(),
            strategies_used,
            active_strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionOutcome;

    fn event(execution: &str, strategy: &str, success: bool, ms: u64) -> AdaptationEvent {
        let outcome = if success {
            ActionOutcome::success(execution, "click", strategy, ms, "example.com")
        } else {
            ActionOutcome::failure(execution, "click", strategy, ms, "example.com")
        };
        AdaptationEvent::from_outcome(&outcome)
    }

    #[test]
    fn effectiveness_is_sorted_and_averaged() {
        let log = EventLog::new();
        log.append(event("a", "spa_navigation", true, 100), 10);
        log.append(event("a", "spa_navigation", false, 300), 10);
        log.append(event("b", "form_filling", true, 50), 10);

        let report = log.effectiveness();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].strategy_id, "form_filling");
        assert_eq!(report[1].usage_count, 2);
        assert_eq!(report[1].success_rate, 0.5);
        assert_eq!(report[1].average_duration_ms, 200.0);
        assert_eq!(log.total(), 3);
    }

    #[test]
    fn history_is_capped_oldest_first() {
        let log = EventLog::new();
        for ms in 0..5 {
            log.append(event("a", "s", true, ms), 3);
        }
        let kept: Vec<u64> = log
            .events(&ExecutionId::from("a"))
            .iter()
            .map(|e| e.duration_ms)
            .collect();
        assert_eq!(kept, vec![2, 3, 4]);
    }

    #[test]
    fn summary_counts_outcomes() {
        let log = EventLog::new();
        log.append(event("a", "s1", true, 10), 10);
        log.append(event("a", "s2", false, 20), 10);
        log.append(event("a", "s1", true, 30), 10);
        let summary = log.summary(&ExecutionId::from("a"), Some("s1".into()));
        assert_eq!(summary.events, 3);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.total_duration_ms, 60);
        assert_eq!(summary.strategies_used, vec!["s1".to_string(), "s2".to_string()]);
    }

    #[test]
    fn failure_events_carry_their_tag() {
        let recorded = event("a", "s", false, 1);
        assert_eq!(recorded.failure_pattern.as_deref(), Some("click:failed"));
        assert!(event("a", "s", true, 1).failure_pattern.is_none());
    }
}
