use adaptive_policy_center::ScoringWeights;

use crate::builtin::{DYNAMIC_CONTENT, SPA_NAVIGATION};
use crate::model::{ExecutionContext, ScoreComponent, Strategy};

/// Additive score of one candidate against one context.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyScore {
    pub strategy_id: String,
    pub score: f64,
    pub components: Vec<ScoreComponent>,
    /// The strategy lists the page type or the complexity.
    pub has_affinity: bool,
}

impl StrategyScore {
    /// Human readable rationale, e.g. `"page_type:dashboard (+20)"`.
    pub fn rationale(&self) -> String {
        self.components
            .iter()
            .filter(|component| component.contribution != 0.0)
            .map(|component| format!("{} ({:+})", component.label, component.contribution))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn score_strategy(
    strategy: &Strategy,
    context: &ExecutionContext,
    weights: &ScoringWeights,
) -> StrategyScore {
    let page = &context.page;
    let mut components = vec![component("baseline", weights.baseline)];

    let page_match = strategy.applies_to_page(page.page_type);
    if page_match {
        components.push(component(
            format!("page_type:{}", page.page_type),
            weights.page_type_match,
        ));
    } else if strategy.is_generic() {
        components.push(component("page_type:generic", weights.page_type_generic));
    } else {
        components.push(component(
            format!("page_type_mismatch:{}", page.page_type),
            weights.page_type_mismatch,
        ));
    }

    let complexity_match = strategy.applies_to_complexity(page.complexity);
    if complexity_match {
        components.push(component(
            format!("complexity:{}", page.complexity),
            weights.complexity_match,
        ));
    } else {
        components.push(component(
            format!("complexity_mismatch:{}", page.complexity),
            weights.complexity_mismatch,
        ));
    }

    if page.is_spa && strategy.id == SPA_NAVIGATION {
        components.push(component("spa", weights.spa_bonus));
    }
    if page.has_dynamic_content && strategy.id == DYNAMIC_CONTENT {
        components.push(component("dynamic_content", weights.dynamic_content_bonus));
    }

    if let Some(site) = &context.site_performance {
        if site.is_effective(&strategy.id) {
            components.push(component(
                "site_history:effective",
                weights.effective_strategy_bonus,
            ));
        }
        if site.success_rate < weights.robustness_success_rate_below
            && strategy.settings.max_retries >= weights.robustness_min_retries
            && strategy.settings.use_ai_fallback
        {
            components.push(component("site_history:robust", weights.robustness_bonus));
        }
    }

    let score: f64 = components.iter().map(|c| c.contribution).sum();
    StrategyScore {
        strategy_id: strategy.id.clone(),
        score,
        components,
        has_affinity: page_match || complexity_match,
    }
}

/// Maps a raw score into `[0, confidence_cap]`.
pub fn confidence(score: f64, weights: &ScoringWeights) -> f64 {
    (score / weights.confidence_scale)
        .min(weights.confidence_cap)
        .max(0.0)
}

fn component(label: impl Into<String>, contribution: f64) -> ScoreComponent {
    ScoreComponent {
        label: label.into(),
        contribution,
    }
}
