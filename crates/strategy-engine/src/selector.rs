use adaptive_policy_center::PolicySnapshot;
use tracing::{debug, info};

use crate::builtin::FALLBACK_STRATEGY;
use crate::errors::{EngineError, Result};
use crate::learning::derive_adjustments;
use crate::model::{
    ExecutionContext, ScoreComponent, SettingsPatch, Strategy, StrategyRecommendation,
    StrategySettings,
};
use crate::score::{confidence, score_strategy, StrategyScore};

pub const FALLBACK_REASON: &str = "No optimal strategy found; using defensive fallback";

/// Ranks `strategies` (in registry order) for `context`.
pub fn rank(
    strategies: &[Strategy],
    context: &ExecutionContext,
    policy: &PolicySnapshot,
) -> Vec<StrategyScore> {
    let mut scored: Vec<StrategyScore> = strategies
        .iter()
        .map(|strategy| {
            let scored = score_strategy(strategy, context, &policy.scoring);
            debug!(
                execution = %context.execution_id,
                strategy = %scored.strategy_id,
                score = scored.score,
                rationale = %scored.rationale(),
                "strategy scored"
            );
            scored
        })
        .collect();
    // stable: equal scores keep registry order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

pub fn select(
    strategies: &[Strategy],
    context: &ExecutionContext,
    policy: &PolicySnapshot,
) -> Result<StrategyRecommendation> {
    if strategies.is_empty() {
        return Err(EngineError::EmptyRegistry);
    }

    let ranked = rank(strategies, context, policy);
    let any_affinity = ranked.iter().any(|scored| scored.has_affinity);
    let best = ranked
        .into_iter()
        .next()
        .filter(|best| best.score > 0.0 && any_affinity);

    let recommendation = match best {
        Some(best) => {
            let base = settings_of(strategies, &best.strategy_id);
            StrategyRecommendation {
                confidence: confidence(best.score, &policy.scoring),
                reasoning: format!(
                    "{} scored {}: {}",
                    best.strategy_id,
                    best.score,
                    best.rationale()
                ),
                adjustments: learned_adjustments(&base, context, policy),
                strategy_id: best.strategy_id,
                score: best.score,
                breakdown: best.components,
                fallback: false,
            }
        }
        None => fallback(strategies, context, policy),
    };

    info!(
        execution = %context.execution_id,
        domain = %context.domain,
        strategy = %recommendation.strategy_id,
        confidence = recommendation.confidence,
        fallback = recommendation.fallback,
        "strategy selected"
    );
    Ok(recommendation)
}

fn fallback(
    strategies: &[Strategy],
    context: &ExecutionContext,
    policy: &PolicySnapshot,
) -> StrategyRecommendation {
    let base = settings_of(strategies, FALLBACK_STRATEGY);
    StrategyRecommendation {
        strategy_id: FALLBACK_STRATEGY.to_string(),
        confidence: policy.scoring.fallback_confidence,
        reasoning: FALLBACK_REASON.to_string(),
        adjustments: learned_adjustments(&base, context, policy),
        score: 0.0,
        breakdown: vec![ScoreComponent {
            label: "fallback".to_string(),
            contribution: 0.0,
        }],
        fallback: true,
    }
}

fn settings_of(strategies: &[Strategy], id: &str) -> StrategySettings {
    strategies
        .iter()
        .find(|strategy| strategy.id == id)
        .map(|strategy| strategy.settings.clone())
        .unwrap_or_default()
}

fn learned_adjustments(
    base: &StrategySettings,
    context: &ExecutionContext,
    policy: &PolicySnapshot,
) -> Option<SettingsPatch> {
    context
        .site_performance
        .as_ref()
        .map(|site| derive_adjustments(base, site, &policy.learning))
}
