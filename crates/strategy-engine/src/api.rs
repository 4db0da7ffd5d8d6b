use std::sync::Arc;

use adaptive_core_types::{ExecutionId, SessionId};
use adaptive_policy_center::{InMemoryPolicyCenter, PolicyCenter, PolicySnapshot};
use page_analyzer::{PageAnalysis, PageAnalyzer, PageSummary};
use tracing::{debug, info, warn};

use crate::active::ActiveStrategyManager;
use crate::analytics::{AnalyticsReport, EventLog};
use crate::errors::Result;
use crate::learning::{self, SitePerformanceTracker};
use crate::metrics::{EngineMetrics, EngineMetricsSnapshot};
use crate::model::{
    ActionOutcome, AdaptationEvent, ExecutionContext, ExecutionSummary, SettingsPatch,
    SitePerformance, Strategy, StrategyRecommendation, StrategySettings,
};
use crate::registry::StrategyRegistry;
use crate::selector;

pub trait StrategyEngine: Send + Sync {
    fn analyze(&self, url: &str, markup: Option<&str>) -> PageAnalysis;
    fn analyze_with_timing(&self, url: &str, markup: Option<&str>, load_time_ms: u64)
        -> PageAnalysis;
    fn analyze_summary(&self, url: &str, summary: &PageSummary) -> PageAnalysis;
    /// Analysis plus the domain's current site record, ready for `select`.
    fn build_context(
        &self,
        execution_id: ExecutionId,
        session_id: SessionId,
        task_type: &str,
        action: &str,
        page: PageAnalysis,
    ) -> ExecutionContext;

    fn register(&self, strategy: Strategy) -> Result<()>;
    fn strategy(&self, id: &str) -> Option<Strategy>;
    fn strategies(&self) -> Vec<Strategy>;

    fn select(&self, context: &ExecutionContext) -> Result<StrategyRecommendation>;
    fn derive_adjustments(
        &self,
        base: &StrategySettings,
        site: &SitePerformance,
        context: &ExecutionContext,
    ) -> SettingsPatch;

    /// Returns `false` and leaves state untouched for an unknown strategy id.
    fn activate(&self, execution_id: &ExecutionId, strategy_id: &str) -> bool;
    fn get_active_settings(&self, execution_id: &ExecutionId) -> StrategySettings;
    fn active_strategy_id(&self, execution_id: &ExecutionId) -> Option<String>;
    fn adjust(&self, execution_id: &ExecutionId, patch: &SettingsPatch) -> StrategySettings;
    fn deactivate(&self, execution_id: &ExecutionId) -> bool;

    fn record_outcome(&self, outcome: ActionOutcome) -> SitePerformance;
    fn site_performance(&self, domain: &str) -> Option<SitePerformance>;
    fn export_site_performance(&self) -> Vec<SitePerformance>;
    fn import_site_performance(&self, sites: Vec<SitePerformance>) -> usize;

    fn report(&self) -> AnalyticsReport;
    fn events(&self, execution_id: &ExecutionId) -> Vec<AdaptationEvent>;
    fn execution_summary(&self, execution_id: &ExecutionId) -> ExecutionSummary;
    /// Drop one execution's history and binding, or everything when `None`.
    fn cleanup(&self, execution_id: Option<&ExecutionId>);

    fn policy(&self) -> Arc<PolicySnapshot>;
    fn metrics(&self) -> EngineMetricsSnapshot;
}

pub struct StrategyEngineBuilder {
    policy: Arc<dyn PolicyCenter>,
    registry: StrategyRegistry,
}

impl StrategyEngineBuilder {
    pub fn new() -> Self {
        Self {
            policy: Arc::new(InMemoryPolicyCenter::default()),
            registry: StrategyRegistry::new(),
        }
    }

    pub fn with_policy(mut self, snapshot: PolicySnapshot) -> Self {
        self.policy = Arc::new(InMemoryPolicyCenter::new(snapshot));
        self
    }

    pub fn with_policy_center(mut self, policy: Arc<dyn PolicyCenter>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Arc<dyn StrategyEngine> {
        Arc::new(self.build_in_memory())
    }

    pub fn build_in_memory(self) -> InMemoryStrategyEngine {
        InMemoryStrategyEngine::new(self.policy, self.registry)
    }
}

impl Default for StrategyEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InMemoryStrategyEngine {
    policy: Arc<dyn PolicyCenter>,
    registry: StrategyRegistry,
    sites: SitePerformanceTracker,
    active: ActiveStrategyManager,
    history: EventLog,
    metrics: EngineMetrics,
}

impl InMemoryStrategyEngine {
    pub fn new(policy: Arc<dyn PolicyCenter>, registry: StrategyRegistry) -> Self {
        Self {
            policy,
            registry,
            sites: SitePerformanceTracker::new(),
            active: ActiveStrategyManager::new(),
            history: EventLog::new(),
            metrics: EngineMetrics::default(),
        }
    }

    fn analyzer(&self) -> PageAnalyzer {
        PageAnalyzer::with_policy(self.policy.snapshot().analyzer.clone())
    }

    /// Re-derive the bound strategy's template against the fresh site record.
    fn auto_adjust(
        &self,
        execution_id: &ExecutionId,
        site: &SitePerformance,
        policy: &PolicySnapshot,
    ) {
        let Some(binding) = self.active.binding(execution_id) else {
            return;
        };
        let base = binding
            .strategy_id
            .as_deref()
            .and_then(|id| self.registry.get(id))
            .map(|strategy| strategy.settings)
            .unwrap_or_default();
        let patch = learning::derive_adjustments(&base, site, &policy.learning);
        if patch.is_empty() {
            return;
        }
        if self.active.adjust_bound(execution_id, &patch).is_none() {
            debug!(execution = %execution_id, "binding released before auto-adjust");
            return;
        }
        self.metrics.record_auto_adjust();
        info!(
            execution = %execution_id,
            domain = %site.domain,
            fields = ?patch.changed_fields(),
            "active strategy auto-adjusted after failure"
        );
    }
}

impl StrategyEngine for InMemoryStrategyEngine {
    fn analyze(&self, url: &str, markup: Option<&str>) -> PageAnalysis {
        self.analyzer().analyze(url, markup)
    }

    fn analyze_with_timing(
        &self,
        url: &str,
        markup: Option<&str>,
        load_time_ms: u64,
    ) -> PageAnalysis {
        self.analyzer().analyze_with_timing(url, markup, load_time_ms)
    }

    fn analyze_summary(&self, url: &str, summary: &PageSummary) -> PageAnalysis {
        self.analyzer().analyze_summary(url, summary)
    }

    fn build_context(
        &self,
        execution_id: ExecutionId,
        session_id: SessionId,
        task_type: &str,
        action: &str,
        page: PageAnalysis,
    ) -> ExecutionContext {
        let site = self.sites.get(&page.domain);
        ExecutionContext::new(execution_id, session_id, task_type, action, page)
            .with_site_performance(site)
    }

    fn register(&self, strategy: Strategy) -> Result<()> {
        self.registry.register(strategy)
    }

    fn strategy(&self, id: &str) -> Option<Strategy> {
        self.registry.get(id)
    }

    fn strategies(&self) -> Vec<Strategy> {
        self.registry.list()
    }

    fn select(&self, context: &ExecutionContext) -> Result<StrategyRecommendation> {
        let policy = self.policy.snapshot();
        let recommendation = selector::select(&self.registry.list(), context, &policy)?;
        self.metrics.record_selection(recommendation.fallback);
        Ok(recommendation)
    }

    fn derive_adjustments(
        &self,
        base: &StrategySettings,
        site: &SitePerformance,
        context: &ExecutionContext,
    ) -> SettingsPatch {
        let patch = learning::derive_adjustments(base, site, &self.policy.snapshot().learning);
        debug!(
            execution = %context.execution_id,
            domain = %site.domain,
            fields = ?patch.changed_fields(),
            "derived site adjustments"
        );
        patch
    }

    fn activate(&self, execution_id: &ExecutionId, strategy_id: &str) -> bool {
        match self.registry.get(strategy_id) {
            Some(strategy) => {
                self.active.bind(execution_id, &strategy.id, strategy.settings);
                info!(execution = %execution_id, strategy = strategy_id, "strategy activated");
                true
            }
            None => {
                warn!(
                    execution = %execution_id,
                    strategy = strategy_id,
                    "activation ignored: unknown strategy"
                );
                false
            }
        }
    }

    fn get_active_settings(&self, execution_id: &ExecutionId) -> StrategySettings {
        self.active.settings(execution_id)
    }

    fn active_strategy_id(&self, execution_id: &ExecutionId) -> Option<String> {
        self.active.strategy_id(execution_id)
    }

    fn adjust(&self, execution_id: &ExecutionId, patch: &SettingsPatch) -> StrategySettings {
        self.active.adjust(execution_id, patch)
    }

    fn deactivate(&self, execution_id: &ExecutionId) -> bool {
        self.active.remove(execution_id)
    }

    fn record_outcome(&self, outcome: ActionOutcome) -> SitePerformance {
        let policy = self.policy.snapshot();
        let dropped = self.history.append(
            AdaptationEvent::from_outcome(&outcome),
            policy.history.max_events_per_execution,
        );
        if dropped > 0 {
            self.metrics.record_truncation(dropped);
        }
        let site = self.sites.record(&outcome, &policy.learning);
        self.metrics.record_outcome(outcome.success);

        if !outcome.success && policy.learning.auto_adjust_active {
            self.auto_adjust(&outcome.execution_id, &site, &policy);
        }
        site
    }

    fn site_performance(&self, domain: &str) -> Option<SitePerformance> {
        self.sites.get(domain)
    }

    fn export_site_performance(&self) -> Vec<SitePerformance> {
        self.sites.export()
    }

    fn import_site_performance(&self, sites: Vec<SitePerformance>) -> usize {
        let imported = self.sites.import(sites);
        info!(imported, "site performance imported");
        imported
    }

    fn report(&self) -> AnalyticsReport {
        AnalyticsReport {
            site_performance: self.sites.export(),
            strategy_effectiveness: self.history.effectiveness(),
            total_events: self.history.total(),
            active_executions: self.active.len(),
            metrics: self.metrics.snapshot(),
        }
    }

    fn events(&self, execution_id: &ExecutionId) -> Vec<AdaptationEvent> {
        self.history.events(execution_id)
    }

    fn execution_summary(&self, execution_id: &ExecutionId) -> ExecutionSummary {
        let active = self.active.strategy_id(execution_id);
        self.history.summary(execution_id, active)
    }

    fn cleanup(&self, execution_id: Option<&ExecutionId>) {
        match execution_id {
            Some(id) => {
                self.history.remove(id);
                self.active.remove(id);
                debug!(execution = %id, "execution state cleaned up");
            }
            None => {
                self.history.clear();
                self.active.clear();
                debug!("all execution state cleaned up");
            }
        }
    }

    fn policy(&self) -> Arc<PolicySnapshot> {
        self.policy.snapshot()
    }

    fn metrics(&self) -> EngineMetricsSnapshot {
        self.metrics.snapshot()
    }
}
