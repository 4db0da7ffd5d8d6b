use std::sync::Arc;
use std::thread;

use adaptive_core_types::ExecutionId;
use adaptive_policy_center::default_snapshot;
use strategy_engine::builtin::{CAREFUL_COMPLEX, FAST_SIMPLE, SPA_NAVIGATION};
use strategy_engine::{
    ActionOutcome, ClickMethod, ScrollMode, SettingsPatch, SitePerformance, StrategyEngine,
    StrategyEngineBuilder, StrategySettings,
};

const DOMAIN: &str = "example.com";

fn exec(id: &str) -> ExecutionId {
    ExecutionId::from(id)
}

#[test]
fn failure_history_keeps_last_ten_distinct_patterns() {
    let engine = StrategyEngineBuilder::new().build();
    for i in 0..12 {
        engine.record_outcome(
            ActionOutcome::failure("e", "click", FAST_SIMPLE, 50, DOMAIN)
                .with_failure_pattern(format!("pattern_{i}")),
        );
    }
    let site = engine.site_performance(DOMAIN).expect("tracked");
    assert_eq!(site.failure_patterns.len(), 10);
    assert!(!site.failure_patterns.contains(&"pattern_0".to_string()));
    assert!(!site.failure_patterns.contains(&"pattern_1".to_string()));
    for i in 2..12 {
        assert!(site.failure_patterns.contains(&format!("pattern_{i}")));
    }
}

#[test]
fn average_action_time_is_an_exact_running_mean() {
    let engine = StrategyEngineBuilder::new().build();
    for ms in [100, 200, 300] {
        engine.record_outcome(ActionOutcome::success("e", "click", FAST_SIMPLE, ms, DOMAIN));
    }
    let site = engine.site_performance(DOMAIN).expect("tracked");
    assert_eq!(site.average_action_time_ms, 200.0);
}

#[test]
fn success_rate_matches_counts_after_every_outcome() {
    let engine = StrategyEngineBuilder::new().build();
    let pattern = [true, false, true, true, false, false, true];
    for (i, success) in pattern.into_iter().enumerate() {
        let outcome = if success {
            ActionOutcome::success("e", "click", FAST_SIMPLE, 10, DOMAIN)
        } else {
            ActionOutcome::failure("e", "click", FAST_SIMPLE, 10, DOMAIN)
        };
        let site = engine.record_outcome(outcome);
        assert_eq!(site.total_actions, i as u64 + 1);
        let expected = site.successful_actions as f64 / site.total_actions as f64;
        assert!((site.success_rate - expected).abs() < 1e-12);
    }
}

#[test]
fn activation_binds_independent_copies() {
    let engine = StrategyEngineBuilder::new().build();
    assert!(engine.activate(&exec("a"), CAREFUL_COMPLEX));
    assert!(engine.activate(&exec("b"), CAREFUL_COMPLEX));

    engine.adjust(
        &exec("a"),
        &SettingsPatch {
            click_method: Some(ClickMethod::Coordinates),
            ..Default::default()
        },
    );

    let a = engine.get_active_settings(&exec("a"));
    let b = engine.get_active_settings(&exec("b"));
    let template = engine.strategy(CAREFUL_COMPLEX).expect("builtin").settings;
    assert_eq!(a.click_method, ClickMethod::Coordinates);
    assert_eq!(a.max_retries, template.max_retries);
    assert_eq!(b, template);
    assert_eq!(engine.active_strategy_id(&exec("a")).as_deref(), Some(CAREFUL_COMPLEX));
}

#[test]
fn unknown_activation_is_ignored() {
    let engine = StrategyEngineBuilder::new().build();
    assert!(!engine.activate(&exec("a"), "does_not_exist"));
    assert_eq!(engine.get_active_settings(&exec("a")), StrategySettings::default());
    assert!(engine.active_strategy_id(&exec("a")).is_none());
}

#[test]
fn failures_auto_adjust_the_active_binding() {
    let engine = StrategyEngineBuilder::new().build();
    let id = exec("run");
    engine.activate(&id, SPA_NAVIGATION);

    engine.record_outcome(
        ActionOutcome::failure("run", "click", SPA_NAVIGATION, 200, DOMAIN)
            .with_failure_pattern("element_not_interactable"),
    );
    let settings = engine.get_active_settings(&id);
    assert_eq!(settings.scroll, ScrollMode::Center);
    assert_eq!(settings.click_method, ClickMethod::Script);
    // one failure out of one action drops the success rate below 0.7
    assert!(settings.max_retries >= 4);
    assert!(settings.screenshot_verification);

    // repeated failures re-derive from the template instead of compounding
    let before = engine.get_active_settings(&id);
    engine.record_outcome(
        ActionOutcome::failure("run", "click", SPA_NAVIGATION, 200, DOMAIN)
            .with_failure_pattern("element_not_interactable"),
    );
    assert_eq!(engine.get_active_settings(&id), before);
    assert_eq!(engine.metrics().auto_adjustments, 2);
}

#[test]
fn auto_adjust_can_be_disabled() {
    let mut policy = default_snapshot();
    policy.learning.auto_adjust_active = false;
    let engine = StrategyEngineBuilder::new().with_policy(policy).build();
    let id = exec("run");
    engine.activate(&id, FAST_SIMPLE);
    engine.record_outcome(ActionOutcome::failure("run", "click", FAST_SIMPLE, 200, DOMAIN));
    assert_eq!(
        engine.get_active_settings(&id),
        engine.strategy(FAST_SIMPLE).expect("builtin").settings
    );
}

#[test]
fn report_is_sorted_and_cleanup_releases_state() {
    let engine = StrategyEngineBuilder::new().build();
    engine.activate(&exec("one"), FAST_SIMPLE);
    engine.record_outcome(ActionOutcome::success("one", "click", SPA_NAVIGATION, 100, "b.test"));
    engine.record_outcome(ActionOutcome::failure("one", "click", FAST_SIMPLE, 300, "a.test"));
    engine.record_outcome(ActionOutcome::success("two", "type", FAST_SIMPLE, 100, "a.test"));

    let report = engine.report();
    assert_eq!(report.total_events, 3);
    assert_eq!(report.active_executions, 1);
    let domains: Vec<_> = report.site_performance.iter().map(|s| s.domain.as_str()).collect();
    assert_eq!(domains, vec!["a.test", "b.test"]);
    let ids: Vec<_> = report
        .strategy_effectiveness
        .iter()
        .map(|s| s.strategy_id.as_str())
        .collect();
    assert_eq!(ids, vec![FAST_SIMPLE, SPA_NAVIGATION]);
    assert_eq!(report.strategy_effectiveness[0].success_rate, 0.5);
    assert_eq!(report.strategy_effectiveness[0].average_duration_ms, 200.0);

    let summary = engine.execution_summary(&exec("one"));
    assert_eq!(summary.events, 2);
    assert_eq!(summary.active_strategy.as_deref(), Some(FAST_SIMPLE));

    engine.cleanup(Some(&exec("one")));
    assert!(engine.events(&exec("one")).is_empty());
    assert!(engine.active_strategy_id(&exec("one")).is_none());
    assert_eq!(engine.report().total_events, 1);
    // site records survive cleanup
    assert!(engine.site_performance("b.test").is_some());

    engine.cleanup(None);
    assert_eq!(engine.report().total_events, 0);
}

#[test]
fn per_execution_history_is_capped() {
    let mut policy = default_snapshot();
    policy.history.max_events_per_execution = 4;
    let engine = StrategyEngineBuilder::new().with_policy(policy).build();
    for ms in 0..10 {
        engine.record_outcome(ActionOutcome::success("long", "click", FAST_SIMPLE, ms, DOMAIN));
    }
    let kept: Vec<u64> = engine
        .events(&exec("long"))
        .iter()
        .map(|event| event.duration_ms)
        .collect();
    assert_eq!(kept, vec![6, 7, 8, 9]);
    assert_eq!(engine.metrics().truncated_events, 6);
    assert_eq!(engine.site_performance(DOMAIN).map(|s| s.total_actions), Some(10));
}

#[test]
fn concurrent_outcomes_are_all_counted() {
    let engine: Arc<dyn StrategyEngine> = StrategyEngineBuilder::new().build();
    thread::scope(|scope| {
        for worker in 0..8 {
            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                for i in 0..50 {
                    let execution = format!("worker-{worker}");
                    let outcome = if i % 2 == 0 {
                        ActionOutcome::success(execution, "click", FAST_SIMPLE, 100, DOMAIN)
                    } else {
                        ActionOutcome::failure(execution, "click", FAST_SIMPLE, 100, DOMAIN)
                    };
                    engine.record_outcome(outcome);
                }
            });
        }
    });
    let site = engine.site_performance(DOMAIN).expect("tracked");
    assert_eq!(site.total_actions, 400);
    assert_eq!(site.successful_actions, 200);
    assert_eq!(site.average_action_time_ms, 100.0);
    assert_eq!(engine.report().total_events, 400);
}

#[test]
fn learned_state_survives_export_and_import() {
    let source = StrategyEngineBuilder::new().build();
    for _ in 0..3 {
        source.record_outcome(ActionOutcome::success("e", "click", CAREFUL_COMPLEX, 250, DOMAIN));
    }
    let exported = serde_json::to_string(&source.export_site_performance()).expect("serialize");

    let target = StrategyEngineBuilder::new().build();
    let sites: Vec<SitePerformance> = serde_json::from_str(&exported).expect("deserialize");
    assert_eq!(target.import_site_performance(sites), 1);
    let site = target.site_performance(DOMAIN).expect("imported");
    assert_eq!(site.total_actions, 3);
    assert!(site.is_effective(CAREFUL_COMPLEX));
}
