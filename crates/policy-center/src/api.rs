use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::PolicyError;
use crate::loader::validate_snapshot;
use crate::model::{PolicySnapshot, PolicySource, RuntimeOverrideSpec};
use crate::override_store::RuntimeOverrideStore;

/// Read access to the live engine policy plus runtime overrides.
pub trait PolicyCenter: Send + Sync {
    fn snapshot(&self) -> Arc<PolicySnapshot>;
    fn apply_override(&self, override_spec: RuntimeOverrideSpec) -> Result<u64, PolicyError>;
    fn clear_override(&self, path: &str) -> Result<bool, PolicyError>;
    fn guard(&self) -> PolicyGuard;
}

struct PolicyState {
    base: PolicySnapshot,
    snapshot: Arc<PolicySnapshot>,
    overrides: RuntimeOverrideStore,
    rev_counter: u64,
}

impl PolicyState {
    fn new(base: PolicySnapshot) -> Self {
        let rev_counter = base.rev;
        Self {
            snapshot: Arc::new(base.clone()),
            base,
            overrides: RuntimeOverrideStore::default(),
            rev_counter,
        }
    }

    fn rebuild(&mut self) -> Result<(), PolicyError> {
        let mut new_snapshot = self.base.clone();
        for (path, value) in self.overrides.active_entries() {
            apply_override_to_snapshot(
                &mut new_snapshot,
                &path,
                &value,
                PolicySource::RuntimeOverride,
            )?;
        }
        validate_snapshot(&new_snapshot)?;
        self.rev_counter = self.rev_counter.saturating_add(1);
        new_snapshot.rev = self.rev_counter;
        self.snapshot = Arc::new(new_snapshot);
        Ok(())
    }
}

pub struct InMemoryPolicyCenter {
    state: RwLock<PolicyState>,
}

impl InMemoryPolicyCenter {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self {
            state: RwLock::new(PolicyState::new(snapshot)),
        }
    }

    pub fn override_count(&self) -> usize {
        self.state.read().overrides.len()
    }
}

impl Default for InMemoryPolicyCenter {
    fn default() -> Self {
        Self::new(crate::defaults::default_snapshot())
    }
}

impl PolicyCenter for InMemoryPolicyCenter {
    fn snapshot(&self) -> Arc<PolicySnapshot> {
        {
            let guard = self.state.read();
            if !guard.overrides.has_expired() {
                return Arc::clone(&guard.snapshot);
            }
        }
        let mut guard = self.state.write();
        if guard.overrides.has_expired() {
            if let Err(err) = guard.rebuild() {
                warn!("policy override expiry recompute failed: {err}");
            }
        }
        Arc::clone(&guard.snapshot)
    }

    fn apply_override(&self, override_spec: RuntimeOverrideSpec) -> Result<u64, PolicyError> {
        let ttl = if override_spec.ttl_seconds > 0 {
            Some(Duration::from_secs(override_spec.ttl_seconds))
        } else {
            None
        };

        let mut guard = self.state.write();
        // Reject before storing so a bad override never poisons later rebuilds.
        let mut probe = (*guard.snapshot).clone();
        apply_override_to_snapshot(
            &mut probe,
            &override_spec.path,
            &override_spec.value,
            PolicySource::RuntimeOverride,
        )?;
        validate_snapshot(&probe)?;

        guard.overrides.insert(
            override_spec.path.clone(),
            override_spec.value.clone(),
            override_spec.owner.clone(),
            ttl,
        );
        guard.rebuild()?;
        let rev = guard.snapshot.rev;
        info!(
            path = %override_spec.path,
            owner = %override_spec.owner,
            reason = %override_spec.reason,
            rev,
            "policy override applied"
        );
        Ok(rev)
    }

    fn clear_override(&self, path: &str) -> Result<bool, PolicyError> {
        let mut guard = self.state.write();
        if !guard.overrides.remove(path) {
            return Ok(false);
        }
        guard.rebuild()?;
        Ok(true)
    }

    fn guard(&self) -> PolicyGuard {
        PolicyGuard {
            snapshot: self.snapshot(),
        }
    }
}

/// Sticky view of one policy revision.
#[derive(Clone, Debug)]
pub struct PolicyGuard {
    snapshot: Arc<PolicySnapshot>,
}

impl PolicyGuard {
    pub fn revision(&self) -> u64 {
        self.snapshot.rev
    }

    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        Arc::clone(&self.snapshot)
    }
}

pub(crate) fn apply_override_to_snapshot(
    snapshot: &mut PolicySnapshot,
    path: &str,
    value: &Value,
    source: PolicySource,
) -> Result<(), PolicyError> {
    let mut segments = path.split('.');
    let section = segments.next().unwrap_or_default();
    let (Some(field), None) = (segments.next(), segments.next()) else {
        return Err(PolicyError::UnsupportedPath(path.to_string()));
    };

    let changed = match section {
        "scoring" => merge_field(&mut snapshot.scoring, path, field, value)?,
        "learning" => merge_field(&mut snapshot.learning, path, field, value)?,
        "analyzer" => merge_field(&mut snapshot.analyzer, path, field, value)?,
        "history" => merge_field(&mut snapshot.history, path, field, value)?,
        _ => return Err(PolicyError::UnsupportedPath(path.to_string())),
    };
    if changed {
        snapshot.set_provenance(path, source);
    }
    Ok(())
}

fn merge_field<T>(section: &mut T, path: &str, field: &str, value: &Value) -> Result<bool, PolicyError>
where
    T: Serialize + DeserializeOwned,
{
    let mut current =
        serde_json::to_value(&*section).map_err(|err| PolicyError::Invalid(format!("{err}")))?;
    let slot = current
        .as_object_mut()
        .and_then(|object| object.get_mut(field))
        .ok_or_else(|| PolicyError::UnsupportedPath(path.to_string()))?;

    let compatible = matches!(
        (&*slot, value),
        (Value::Number(_), Value::Number(_)) | (Value::Bool(_), Value::Bool(_))
    );
    if !compatible {
        return Err(PolicyError::InvalidValue {
            path: path.to_string(),
            reason: format!("expected {}, got {value}", kind_of(slot)),
        });
    }
    if same_value(slot, value) {
        return Ok(false);
    }
    *slot = value.clone();

    let updated: T = serde_json::from_value(current).map_err(|err| PolicyError::InvalidValue {
        path: path.to_string(),
        reason: err.to_string(),
    })?;
    *section = updated;
    Ok(true)
}

fn same_value(current: &Value, candidate: &Value) -> bool {
    match (current.as_f64(), candidate.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => current == candidate,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}
