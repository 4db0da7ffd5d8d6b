use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct EngineMetrics {
    selections: AtomicU64,
    fallbacks: AtomicU64,
    outcomes: AtomicU64,
    successes: AtomicU64,
    auto_adjustments: AtomicU64,
    truncated_events: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineMetricsSnapshot {
    pub selections: u64,
    pub fallbacks: u64,
    pub fallback_rate: f64,
    pub outcomes: u64,
    pub successes: u64,
    pub success_rate: f64,
    pub auto_adjustments: u64,
    pub truncated_events: u64,
}

impl EngineMetrics {
    pub fn record_selection(&self, fallback: bool) {
        self.selections.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_outcome(&self, success: bool) {
        self.outcomes.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_auto_adjust(&self) {
        self.auto_adjustments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_truncation(&self, dropped: usize) {
        self.truncated_events
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        let selections = self.selections.load(Ordering::Relaxed);
        let fallbacks = self.fallbacks.load(Ordering::Relaxed);
        let outcomes = self.outcomes.load(Ordering::Relaxed);
        let successes = self.successes.load(Ordering::Relaxed);
        EngineMetricsSnapshot {
            selections,
            fallbacks,
            fallback_rate: ratio(fallbacks, selections),
            outcomes,
            successes,
            success_rate: ratio(successes, outcomes),
            auto_adjustments: self.auto_adjustments.load(Ordering::Relaxed),
            truncated_events: self.truncated_events.load(Ordering::Relaxed),
        }
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reports_rates() {
        let metrics = EngineMetrics::default();
        metrics.record_selection(false);
        metrics.record_selection(true);
        metrics.record_outcome(true);
        metrics.record_outcome(true);
        metrics.record_outcome(false);
        metrics.record_outcome(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.selections, 2);
        assert_eq!(snapshot.fallbacks, 1);
        assert!((snapshot.fallback_rate - 0.5).abs() < f64::EPSILON);
        assert!((snapshot.success_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_snapshot_has_zero_rates() {
        let snapshot = EngineMetrics::default().snapshot();
        assert_eq!(snapshot, EngineMetricsSnapshot::default());
    }
}
