use std::collections::VecDeque;

use adaptive_policy_center::LearningPolicy;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::model::{
    ActionOutcome, ClickMethod, ScrollMode, SettingsPatch, SitePerformance, StrategySettings,
};

const NOT_FOUND_TAG: &str = "element_not_found";
const TIMEOUT_TAG: &str = "timeout";
const NOT_INTERACTABLE_TAG: &str = "element_not_interactable";

/// Per-domain rolling statistics, created lazily on first outcome.
#[derive(Default)]
pub struct SitePerformanceTracker {
    sites: DashMap<String, SitePerformance>,
}

impl SitePerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into its domain record and return the updated record.
    pub fn record(&self, outcome: &ActionOutcome, policy: &LearningPolicy) -> SitePerformance {
        let mut entry = self
            .sites
            .entry(outcome.domain.clone())
            .or_insert_with(|| SitePerformance::new(outcome.domain.clone()));
        let site = entry.value_mut();

        site.total_actions = site.total_actions.saturating_add(1);
        if outcome.success {
            site.successful_actions = site.successful_actions.saturating_add(1);
            push_unique(
                &mut site.effective_strategies,
                &outcome.strategy_id,
                policy.max_effective_strategies,
            );
        } else {
            push_unique(
                &mut site.failure_patterns,
                &outcome.failure_tag(),
                policy.max_failure_patterns,
            );
        }

        let n = site.total_actions as f64;
        site.success_rate = site.successful_actions as f64 / n;
        site.average_action_time_ms =
            (site.average_action_time_ms * (n - 1.0) + outcome.duration_ms as f64) / n;
        site.last_updated = Utc::now();

        debug!(
            domain = %site.domain,
            total = site.total_actions,
            success_rate = site.success_rate,
            avg_ms = site.average_action_time_ms,
            "site performance updated"
        );
        site.clone()
    }

    pub fn get(&self, domain: &str) -> Option<SitePerformance> {
        self.sites.get(domain).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Snapshot of all domains, sorted by domain.
    pub fn export(&self) -> Vec<SitePerformance> {
        let mut sites: Vec<_> = self
            .sites
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sites.sort_by(|a, b| a.domain.cmp(&b.domain));
        sites
    }

    /// Replace records for the imported domains; other domains are kept.
    pub fn import(&self, sites: Vec<SitePerformance>) -> usize {
        let mut imported = 0;
        for site in sites {
            if site.domain.trim().is_empty() {
                continue;
            }
            self.sites.insert(site.domain.clone(), site);
            imported += 1;
        }
        imported
    }
}

fn push_unique(list: &mut VecDeque<String>, value: &str, cap: usize) {
    if list.iter().any(|existing| existing == value) {
        return;
    }
    list.push_back(value.to_string());
    while list.len() > cap.max(1) {
        list.pop_front();
    }
}

/// Learned, site-specific overrides for `base`.
///
/// Rules run in a fixed order and rules touching the same field compound:
/// slow site, then low success rate, then failure-pattern bumps (each at most
/// once per call).
pub fn derive_adjustments(
    base: &StrategySettings,
    site: &SitePerformance,
    policy: &LearningPolicy,
) -> SettingsPatch {
    let mut patch = SettingsPatch::default();
    let mut timeout = base.timeout_ms;
    let mut wait_before = base.wait_before_action_ms;

    if site.average_action_time_ms > policy.slow_site_threshold_ms {
        let inflated = site.average_action_time_ms * policy.slow_site_timeout_factor;
        timeout = timeout.max(to_millis(inflated, timeout));
        wait_before = scale(wait_before, policy.slow_site_wait_factor);
        patch.timeout_ms = Some(timeout);
        patch.wait_before_action_ms = Some(wait_before);
        patch.wait_after_action_ms = Some(scale(
            base.wait_after_action_ms,
            policy.slow_site_wait_factor,
        ));
    }

    if site.success_rate < policy.low_success_rate_below {
        patch.max_retries = Some(base.max_retries.max(policy.low_success_min_retries));
        patch.retry_on_failure = Some(true);
        patch.use_ai_fallback = Some(true);
        patch.screenshot_verification = Some(true);
    }

    let matches = |tag: &str| site.failure_patterns.iter().any(|p| p.contains(tag));
    if matches(NOT_FOUND_TAG) {
        patch.wait_before_action_ms = Some(scale(wait_before, policy.not_found_wait_factor));
    }
    if matches(TIMEOUT_TAG) {
        patch.timeout_ms = Some(scale(timeout, policy.timeout_pattern_factor));
    }
    if matches(NOT_INTERACTABLE_TAG) {
        patch.scroll = Some(ScrollMode::Center);
        patch.click_method = Some(ClickMethod::Script);
    }

    patch
}

fn scale(value: u64, factor: f64) -> u64 {
    to_millis(value as f64 * factor, value)
}

fn to_millis(value: f64, fallback: u64) -> u64 {
    if value.is_finite() && value >= 0.0 {
        value.round() as u64
    } else {
        fallback
    }
}
