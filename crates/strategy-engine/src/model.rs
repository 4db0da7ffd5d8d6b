use std::collections::VecDeque;

use adaptive_core_types::{Complexity, ExecutionId, PageType, SessionId};
use chrono::{DateTime, Utc};
use page_analyzer::PageAnalysis;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMode {
    Off,
    Nearest,
    Center,
}

/// How a click is delivered to the page.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickMethod {
    /// Simulated native pointer input.
    Native,
    /// Direct `element.click()` invocation.
    Script,
    /// Raw viewport coordinates.
    Coordinates,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeMethod {
    Keystrokes,
    Fill,
    Script,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMethod {
    Goto,
    Click,
    History,
}

/// Tunable interaction parameters handed to the action executor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategySettings {
    pub wait_before_action_ms: u64,
    pub wait_after_action_ms: u64,
    pub use_ai_fallback: bool,
    pub scroll: ScrollMode,
    pub retry_on_failure: bool,
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub screenshot_verification: bool,
    pub click_method: ClickMethod,
    pub type_method: TypeMethod,
    pub navigation_method: NavigationMethod,
}

impl Default for StrategySettings {
    /// Baseline used for executions with no bound strategy.
    fn default() -> Self {
        Self {
            wait_before_action_ms: 500,
            wait_after_action_ms: 1_000,
            use_ai_fallback: false,
            scroll: ScrollMode::Nearest,
            retry_on_failure: true,
            max_retries: 2,
            timeout_ms: 30_000,
            screenshot_verification: false,
            click_method: ClickMethod::Native,
            type_method: TypeMethod::Keystrokes,
            navigation_method: NavigationMethod::Goto,
        }
    }
}

/// Partial overlay of [`StrategySettings`]; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_before_action_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_after_action_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_ai_fallback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll: Option<ScrollMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_on_failure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_method: Option<ClickMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_method: Option<TypeMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_method: Option<NavigationMethod>,
}

macro_rules! patch_fields {
    ($macro:ident) => {
        $macro!(
            wait_before_action_ms,
            wait_after_action_ms,
            use_ai_fallback,
            scroll,
            retry_on_failure,
            max_retries,
            timeout_ms,
            screenshot_verification,
            click_method,
            type_method,
            navigation_method
        )
    };
}

impl SettingsPatch {
    pub fn apply_to(&self, settings: &mut StrategySettings) {
        macro_rules! apply {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field.clone() {
                    settings.$field = value;
                })*
            };
        }
        patch_fields!(apply);
    }

    /// Fold `other` into `self`; fields set in `other` win.
    pub fn merge(&mut self, other: &SettingsPatch) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        patch_fields!(merge);
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        macro_rules! collect {
            ($($field:ident),*) => {
                $(if self.$field.is_some() {
                    fields.push(stringify!($field));
                })*
            };
        }
        patch_fields!(collect);
        fields
    }
}

/// Registered, read-only strategy template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub description: String,
    pub page_types: Vec<PageType>,
    pub complexities: Vec<Complexity>,
    pub settings: StrategySettings,
}

impl Strategy {
    pub fn applies_to_page(&self, page_type: PageType) -> bool {
        self.page_types.contains(&page_type)
    }

    pub fn is_generic(&self) -> bool {
        self.page_types.contains(&PageType::Unknown)
    }

    pub fn applies_to_complexity(&self, complexity: Complexity) -> bool {
        self.complexities.contains(&complexity)
    }
}

/// Selector input for one upcoming action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub execution_id: ExecutionId,
    pub session_id: SessionId,
    pub task_type: String,
    pub url: String,
    pub domain: String,
    pub action: String,
    pub page: PageAnalysis,
    pub site_performance: Option<SitePerformance>,
}

impl ExecutionContext {
    pub fn new(
        execution_id: ExecutionId,
        session_id: SessionId,
        task_type: impl Into<String>,
        action: impl Into<String>,
        page: PageAnalysis,
    ) -> Self {
        Self {
            execution_id,
            session_id,
            task_type: task_type.into(),
            url: page.url.clone(),
            domain: page.domain.clone(),
            action: action.into(),
            page,
            site_performance: None,
        }
    }

    pub fn with_site_performance(mut self, site: Option<SitePerformance>) -> Self {
        self.site_performance = site;
        self
    }
}

/// Rolling per-domain statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SitePerformance {
    pub domain: String,
    pub total_actions: u64,
    pub successful_actions: u64,
    pub success_rate: f64,
    pub average_action_time_ms: f64,
    pub failure_patterns: VecDeque<String>,
    pub effective_strategies: VecDeque<String>,
    pub last_updated: DateTime<Utc>,
}

impl SitePerformance {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            total_actions: 0,
            successful_actions: 0,
            success_rate: 0.0,
            average_action_time_ms: 0.0,
            failure_patterns: VecDeque::new(),
            effective_strategies: VecDeque::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn is_effective(&self, strategy_id: &str) -> bool {
        self.effective_strategies.iter().any(|id| id == strategy_id)
    }
}

/// One reported action outcome, as handed to `record_outcome`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub execution_id: ExecutionId,
    pub action: String,
    pub strategy_id: String,
    pub success: bool,
    pub duration_ms: u64,
    pub domain: String,
    #[serde(default)]
    pub adjustments: Option<SettingsPatch>,
    /// Classified failure tag from the orchestrator, e.g. `"timeout"`.
    #[serde(default)]
    pub failure_pattern: Option<String>,
}

impl ActionOutcome {
    pub fn success(
        execution_id: impl Into<ExecutionId>,
        action: impl Into<String>,
        strategy_id: impl Into<String>,
        duration_ms: u64,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            action: action.into(),
            strategy_id: strategy_id.into(),
            success: true,
            duration_ms,
            domain: domain.into(),
            adjustments: None,
            failure_pattern: None,
        }
    }

    pub fn failure(
        execution_id: impl Into<ExecutionId>,
        action: impl Into<String>,
        strategy_id: impl Into<String>,
        duration_ms: u64,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            ..Self::success(execution_id, action, strategy_id, duration_ms, domain)
        }
    }

    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failure_pattern = Some(pattern.into());
        self
    }

    pub fn with_adjustments(mut self, adjustments: SettingsPatch) -> Self {
        self.adjustments = Some(adjustments);
        self
    }

    /// Tag recorded against the domain when this outcome is a failure.
    pub fn failure_tag(&self) -> String {
        match &self.failure_pattern {
            Some(pattern) if !pattern.trim().is_empty() => pattern.trim().to_string(),
            _ => format!("{}:failed", self.action),
        }
    }
}

/// Immutable log record of one scored action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptationEvent {
    pub timestamp: DateTime<Utc>,
    pub execution_id: ExecutionId,
    pub action: String,
    pub strategy_id: String,
    pub success: bool,
    pub duration_ms: u64,
    pub domain: String,
    pub failure_pattern: Option<String>,
    pub adjustments: Option<SettingsPatch>,
}

impl AdaptationEvent {
    pub fn from_outcome(outcome: &ActionOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            execution_id: outcome.execution_id.clone(),
            action: outcome.action.clone(),
            strategy_id: outcome.strategy_id.clone(),
            success: outcome.success,
            duration_ms: outcome.duration_ms,
            domain: outcome.domain.clone(),
            failure_pattern: (!outcome.success).then(|| outcome.failure_tag()),
            adjustments: outcome.adjustments.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub label: String,
    pub contribution: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub strategy_id: String,
    pub confidence: f64,
    pub reasoning: String,
    pub adjustments: Option<SettingsPatch>,
    pub score: f64,
    pub breakdown: Vec<ScoreComponent>,
    pub fallback: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyEffectiveness {
    pub strategy_id: String,
    pub usage_count: u64,
    pub success_count: u64,
    pub success_rate: f64,
    pub average_duration_ms: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub execution_id: ExecutionId,
    pub events: usize,
    pub successes: usize,
    pub failures: usize,
    pub total_duration_ms: u64,
    pub strategies_used: Vec<String>,
    pub active_strategy: Option<String>,
}
