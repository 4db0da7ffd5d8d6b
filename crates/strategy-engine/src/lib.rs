//! Strategy selection and per-site learning for adaptive page automation.
//!
//! A [`StrategyEngine`] scores registered strategies against a page analysis
//! and the domain's history, binds mutable settings per execution and folds
//! reported outcomes back into the site records.

pub mod active;
pub mod analytics;
pub mod api;
pub mod builtin;
pub mod errors;
pub mod learning;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod score;
pub mod selector;

pub use analytics::AnalyticsReport;
pub use api::{InMemoryStrategyEngine, StrategyEngine, StrategyEngineBuilder};
pub use errors::{EngineError, Result};
pub use learning::derive_adjustments;
pub use metrics::EngineMetricsSnapshot;
pub use model::{
    ActionOutcome, AdaptationEvent, ClickMethod, ExecutionContext, ExecutionSummary,
    NavigationMethod, ScoreComponent, ScrollMode, SettingsPatch, SitePerformance, Strategy,
    StrategyEffectiveness, StrategyRecommendation, StrategySettings, TypeMethod,
};
pub use registry::StrategyRegistry;
