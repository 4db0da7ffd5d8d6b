use crate::model::{
    AnalyzerPolicy, HistoryPolicy, LearningPolicy, PolicySnapshot, ScoringWeights,
};

pub fn default_snapshot() -> PolicySnapshot {
    PolicySnapshot {
        rev: 1,
        scoring: ScoringWeights::default(),
        learning: LearningPolicy::default(),
        analyzer: AnalyzerPolicy::default(),
        history: HistoryPolicy::default(),
        provenance: Default::default(),
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            baseline: 50.0,
            page_type_match: 20.0,
            page_type_generic: 5.0,
            page_type_mismatch: -20.0,
            complexity_match: 15.0,
            complexity_mismatch: -15.0,
            spa_bonus: 25.0,
            dynamic_content_bonus: 20.0,
            effective_strategy_bonus: 30.0,
            robustness_bonus: 15.0,
            robustness_success_rate_below: 0.5,
            robustness_min_retries: 3,
            confidence_scale: 100.0,
            confidence_cap: 0.95,
            fallback_confidence: 0.5,
        }
    }
}

impl Default for LearningPolicy {
    fn default() -> Self {
        Self {
            slow_site_threshold_ms: 5_000.0,
            slow_site_timeout_factor: 3.0,
            slow_site_wait_factor: 1.5,
            low_success_rate_below: 0.7,
            low_success_min_retries: 4,
            not_found_wait_factor: 1.5,
            timeout_pattern_factor: 1.5,
            max_failure_patterns: 10,
            max_effective_strategies: 5,
            auto_adjust_active: true,
        }
    }
}

impl Default for AnalyzerPolicy {
    fn default() -> Self {
        Self {
            complex_script_count: 20,
            complex_container_count: 500,
            complex_field_count: 50,
            simple_script_count: 5,
            simple_container_count: 50,
            simple_field_count: 10,
        }
    }
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            max_events_per_execution: 1_000,
        }
    }
}
