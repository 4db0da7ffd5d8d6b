use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::api::apply_override_to_snapshot;
use crate::defaults::default_snapshot;
use crate::errors::PolicyError;
use crate::model::{PolicySnapshot, PolicySource};

const ENV_PREFIX: &str = "ADAPTIVE_POLICY__";
const ENV_JSON: &str = "ADAPTIVE_POLICY_OVERRIDE_JSON";

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
        }
    }
}

/// Builtin defaults, then the optional YAML file, then environment overlays.
pub fn load_snapshot(path: Option<&Path>) -> Result<PolicySnapshot, PolicyError> {
    let mut options = LoadOptions::default();
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    options.include_env = true;
    load_snapshot_with_options(&options)
}

pub fn load_snapshot_with_options(options: &LoadOptions) -> Result<PolicySnapshot, PolicyError> {
    let mut snapshot = default_snapshot();
    bootstrap_builtin_provenance(&mut snapshot)?;

    for path in &options.paths {
        if path.exists() {
            let overlay = overlays_from_file(path)?;
            debug!(path = %path.display(), entries = overlay.len(), "policy file overlay");
            apply_overlays(&mut snapshot, overlay)?;
        }
    }

    if options.include_env {
        let env_overlays = overlays_from_env()?;
        apply_overlays(&mut snapshot, env_overlays)?;
    }

    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

/// Cross-field sanity checks the per-field merge cannot express.
pub(crate) fn validate_snapshot(snapshot: &PolicySnapshot) -> Result<(), PolicyError> {
    let scoring = &snapshot.scoring;
    if !(scoring.confidence_cap > 0.0 && scoring.confidence_cap <= 1.0) {
        return Err(PolicyError::Invalid(format!(
            "scoring.confidence_cap must be in (0, 1], got {}",
            scoring.confidence_cap
        )));
    }
    if !(0.0..=scoring.confidence_cap).contains(&scoring.fallback_confidence) {
        return Err(PolicyError::Invalid(format!(
            "scoring.fallback_confidence must be in [0, {}], got {}",
            scoring.confidence_cap, scoring.fallback_confidence
        )));
    }
    if scoring.confidence_scale <= 0.0 {
        return Err(PolicyError::Invalid(
            "scoring.confidence_scale must be positive".into(),
        ));
    }
    let learning = &snapshot.learning;
    if learning.max_failure_patterns == 0 || learning.max_effective_strategies == 0 {
        return Err(PolicyError::Invalid(
            "learning history caps must be at least 1".into(),
        ));
    }
    if snapshot.history.max_events_per_execution == 0 {
        return Err(PolicyError::Invalid(
            "history.max_events_per_execution must be at least 1".into(),
        ));
    }
    let analyzer = &snapshot.analyzer;
    if analyzer.simple_script_count > analyzer.complex_script_count
        || analyzer.simple_container_count > analyzer.complex_container_count
        || analyzer.simple_field_count > analyzer.complex_field_count
    {
        return Err(PolicyError::Invalid(
            "analyzer simple thresholds must not exceed complex thresholds".into(),
        ));
    }
    Ok(())
}

struct PolicyOverlay {
    path: String,
    value: Value,
    source: PolicySource,
}

fn apply_overlays(
    snapshot: &mut PolicySnapshot,
    overlays: Vec<PolicyOverlay>,
) -> Result<(), PolicyError> {
    for overlay in overlays {
        apply_override_to_snapshot(snapshot, &overlay.path, &overlay.value, overlay.source)?;
    }
    Ok(())
}

fn overlays_from_file(path: &Path) -> Result<Vec<PolicyOverlay>, PolicyError> {
    let content = fs::read_to_string(path).map_err(|err| PolicyError::Io(format!("{}", err)))?;
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
    Ok(flatten_value(json_value, None, PolicySource::File))
}

fn overlays_from_env() -> Result<Vec<PolicyOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    let mut vars: Vec<(String, String)> = env::vars().collect();
    vars.sort();
    for (key, raw) in vars {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let path = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join(".");
            if path.is_empty() {
                continue;
            }
            let value = parse_env_value(&raw);
            overlays.push(PolicyOverlay {
                path,
                value,
                source: PolicySource::Env,
            });
        }
    }

    if let Ok(raw_json) = env::var(ENV_JSON) {
        if !raw_json.trim().is_empty() {
            let json_value: Value = serde_json::from_str(&raw_json)
                .map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
            overlays.extend(flatten_value(json_value, None, PolicySource::Env));
        }
    }

    Ok(overlays)
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    Value::String(raw.to_string())
}

fn flatten_value(value: Value, prefix: Option<String>, source: PolicySource) -> Vec<PolicyOverlay> {
    match value {
        Value::Object(map) => {
            let mut result = Vec::new();
            for (key, value) in map {
                let key_segment = key.trim().to_ascii_lowercase();
                let next_prefix = match &prefix {
                    Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, key_segment),
                    _ => key_segment.clone(),
                };
                result.extend(flatten_value(value, Some(next_prefix), source));
            }
            result
        }
        other => {
            if let Some(prefix) = prefix {
                vec![PolicyOverlay {
                    path: prefix,
                    value: other,
                    source,
                }]
            } else {
                Vec::new()
            }
        }
    }
}

fn bootstrap_builtin_provenance(snapshot: &mut PolicySnapshot) -> Result<(), PolicyError> {
    let sections = [
        (
            "scoring",
            serde_json::to_value(&snapshot.scoring)
                .map_err(|err| PolicyError::Invalid(format!("{}", err)))?,
        ),
        (
            "learning",
            serde_json::to_value(&snapshot.learning)
                .map_err(|err| PolicyError::Invalid(format!("{}", err)))?,
        ),
        (
            "analyzer",
            serde_json::to_value(&snapshot.analyzer)
                .map_err(|err| PolicyError::Invalid(format!("{}", err)))?,
        ),
        (
            "history",
            serde_json::to_value(&snapshot.history)
                .map_err(|err| PolicyError::Invalid(format!("{}", err)))?,
        ),
    ];

    for (name, value) in sections {
        for overlay in flatten_value(value, Some(name.into()), PolicySource::Builtin) {
            snapshot.set_provenance(&overlay.path, overlay.source);
        }
    }
    Ok(())
}
