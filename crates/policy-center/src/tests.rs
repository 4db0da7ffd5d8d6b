use crate::api::{InMemoryPolicyCenter, PolicyCenter};
use crate::defaults::default_snapshot;
use crate::errors::PolicyError;
use crate::loader::{load_snapshot, load_snapshot_with_options, LoadOptions};
use crate::model::{PolicySource, RuntimeOverrideSpec};
use std::env;
use std::sync::{Mutex, OnceLock};

fn spec(path: &str, value: serde_json::Value) -> RuntimeOverrideSpec {
    RuntimeOverrideSpec {
        path: path.into(),
        value,
        owner: "test".into(),
        reason: "unit test".into(),
        ttl_seconds: 0,
    }
}

#[test]
fn default_snapshot_keeps_heuristic_weights() {
    let snapshot = default_snapshot();
    assert_eq!(snapshot.scoring.baseline, 50.0);
    assert_eq!(snapshot.scoring.page_type_match, 20.0);
    assert_eq!(snapshot.scoring.effective_strategy_bonus, 30.0);
    assert_eq!(snapshot.scoring.confidence_cap, 0.95);
    assert_eq!(snapshot.learning.max_failure_patterns, 10);
    assert_eq!(snapshot.learning.max_effective_strategies, 5);
}

#[test]
fn load_snapshot_applies_file_overlay() {
    let _guard = env_guard().lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("policy.yaml");
    std::fs::write(
        &file_path,
        r#"scoring:
  baseline: 40
  spa_bonus: 30.5
learning:
  auto_adjust_active: false
history:
  max_events_per_execution: 250
"#,
    )
    .unwrap();

    let snapshot = load_snapshot(Some(&file_path)).unwrap();
    assert_eq!(snapshot.scoring.baseline, 40.0);
    assert_eq!(snapshot.scoring.spa_bonus, 30.5);
    assert!(!snapshot.learning.auto_adjust_active);
    assert_eq!(snapshot.history.max_events_per_execution, 250);
    assert_eq!(snapshot.source_of("scoring.baseline"), Some(PolicySource::File));
    assert_eq!(
        snapshot.source_of("scoring.page_type_match"),
        Some(PolicySource::Builtin)
    );
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let _guard = env_guard().lock().unwrap();
    let options = LoadOptions {
        paths: vec!["/nonexistent/adaptive-policy.yaml".into()],
        include_env: false,
    };
    let snapshot = load_snapshot_with_options(&options).unwrap();
    assert_eq!(snapshot.scoring, default_snapshot().scoring);
}

#[test]
fn file_with_unknown_path_is_rejected() {
    let _guard = env_guard().lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("policy.yaml");
    std::fs::write(&file_path, "scoring:\n  mystery_weight: 3\n").unwrap();
    let err = load_snapshot(Some(&file_path)).unwrap_err();
    assert!(matches!(err, PolicyError::UnsupportedPath(path) if path == "scoring.mystery_weight"));
}

#[test]
fn env_overlay_records_provenance() {
    let _guard = env_guard().lock().unwrap();
    let key = "ADAPTIVE_POLICY__LEARNING__SLOW_SITE_THRESHOLD_MS";
    env::set_var(key, "8000");
    let snapshot = load_snapshot(None);
    env::remove_var(key);
    let snapshot = snapshot.expect("load snapshot");
    assert_eq!(snapshot.learning.slow_site_threshold_ms, 8000.0);
    assert_eq!(
        snapshot.source_of("learning.slow_site_threshold_ms"),
        Some(PolicySource::Env)
    );
}

#[test]
fn env_json_overlay_is_flattened() {
    let _guard = env_guard().lock().unwrap();
    env::set_var(
        "ADAPTIVE_POLICY_OVERRIDE_JSON",
        r#"{"analyzer": {"complex_script_count": 30}}"#,
    );
    let snapshot = load_snapshot(None);
    env::remove_var("ADAPTIVE_POLICY_OVERRIDE_JSON");
    assert_eq!(snapshot.unwrap().analyzer.complex_script_count, 30);
}

#[test]
fn type_mismatch_is_invalid_value() {
    let center = InMemoryPolicyCenter::default();
    let err = center
        .apply_override(spec("learning.auto_adjust_active", serde_json::json!(3)))
        .unwrap_err();
    assert!(matches!(err, PolicyError::InvalidValue { .. }));

    let err = center
        .apply_override(spec("learning.max_failure_patterns", serde_json::json!(2.5)))
        .unwrap_err();
    assert!(matches!(err, PolicyError::InvalidValue { .. }));
    assert_eq!(center.override_count(), 0);
}

#[test]
fn cross_field_validation_rejects_bad_confidence() {
    let center = InMemoryPolicyCenter::default();
    let err = center
        .apply_override(spec("scoring.fallback_confidence", serde_json::json!(0.99)))
        .unwrap_err();
    assert!(matches!(err, PolicyError::Invalid(_)));
}

#[test]
fn override_updates_snapshot_and_revision() {
    let center = InMemoryPolicyCenter::new(default_snapshot());
    let before = center.guard();
    let rev = center
        .apply_override(spec("scoring.spa_bonus", serde_json::json!(40)))
        .unwrap();
    let snapshot = center.snapshot();
    assert_eq!(snapshot.scoring.spa_bonus, 40.0);
    assert_eq!(snapshot.rev, rev);
    assert!(rev > before.revision());
    assert_eq!(
        snapshot.source_of("scoring.spa_bonus"),
        Some(PolicySource::RuntimeOverride)
    );
    // The earlier guard keeps its revision.
    assert_eq!(before.snapshot().scoring.spa_bonus, 25.0);
}

#[test]
fn clearing_override_restores_base() {
    let center = InMemoryPolicyCenter::default();
    center
        .apply_override(spec("history.max_events_per_execution", serde_json::json!(10)))
        .unwrap();
    assert!(center.clear_override("history.max_events_per_execution").unwrap());
    assert!(!center.clear_override("history.max_events_per_execution").unwrap());
    assert_eq!(center.snapshot().history.max_events_per_execution, 1_000);
}

fn env_guard() -> &'static Mutex<()> {
    static ENV_GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_GUARD.get_or_init(|| Mutex::new(()))
}
