//! Adaptive execution strategy engine
//!
//! Re-exports the engine crates and provides process bootstrap: policy
//! loading, tracing setup and engine assembly.

pub mod bootstrap;
pub mod telemetry;

pub use adaptive_core_types::{Complexity, ExecutionId, PageType, SessionId};
pub use adaptive_policy_center as policy;
pub use bootstrap::{bootstrap, Bootstrapped, EngineOptions};
pub use page_analyzer::{PageAnalysis, PageAnalyzer, PageSummary};
pub use strategy_engine::{
    ActionOutcome, AnalyticsReport, SettingsPatch, SitePerformance, Strategy, StrategyEngine,
    StrategyEngineBuilder, StrategyRecommendation, StrategySettings,
};
