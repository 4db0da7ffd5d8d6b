use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Full engine policy at one revision.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PolicySnapshot {
    pub rev: u64,
    pub scoring: ScoringWeights,
    pub learning: LearningPolicy,
    pub analyzer: AnalyzerPolicy,
    pub history: HistoryPolicy,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub provenance: HashMap<String, PolicyProvenance>,
}

/// Additive weights used by the strategy selector.
///
/// Defaults reproduce the historical heuristic constants; they carry no
/// derivation and should only be retuned against new outcome data.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoringWeights {
    pub baseline: f64,
    pub page_type_match: f64,
    pub page_type_generic: f64,
    pub page_type_mismatch: f64,
    pub complexity_match: f64,
    pub complexity_mismatch: f64,
    pub spa_bonus: f64,
    pub dynamic_content_bonus: f64,
    pub effective_strategy_bonus: f64,
    pub robustness_bonus: f64,
    pub robustness_success_rate_below: f64,
    pub robustness_min_retries: u32,
    pub confidence_scale: f64,
    pub confidence_cap: f64,
    pub fallback_confidence: f64,
}

/// Thresholds and multipliers for learned, site-specific adjustments.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LearningPolicy {
    pub slow_site_threshold_ms: f64,
    pub slow_site_timeout_factor: f64,
    pub slow_site_wait_factor: f64,
    pub low_success_rate_below: f64,
    pub low_success_min_retries: u32,
    pub not_found_wait_factor: f64,
    pub timeout_pattern_factor: f64,
    pub max_failure_patterns: usize,
    pub max_effective_strategies: usize,
    pub auto_adjust_active: bool,
}

/// Structural count thresholds for complexity estimation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerPolicy {
    pub complex_script_count: usize,
    pub complex_container_count: usize,
    pub complex_field_count: usize,
    pub simple_script_count: usize,
    pub simple_container_count: usize,
    pub simple_field_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryPolicy {
    pub max_events_per_execution: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyProvenance {
    pub path: String,
    pub source: PolicySource,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicySource {
    Builtin,
    File,
    Env,
    RuntimeOverride,
}

impl PolicySnapshot {
    pub fn set_provenance(&mut self, path: &str, source: PolicySource) {
        self.provenance.insert(
            path.to_string(),
            PolicyProvenance {
                path: path.to_string(),
                source,
            },
        );
    }

    pub fn source_of(&self, path: &str) -> Option<PolicySource> {
        self.provenance.get(path).map(|entry| entry.source)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeOverrideSpec {
    pub path: String,
    pub value: serde_json::Value,
    pub owner: String,
    pub reason: String,
    #[serde(default)]
    pub ttl_seconds: u64,
}
