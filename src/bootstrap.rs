use std::path::PathBuf;
use std::sync::Arc;

use adaptive_policy_center::{load_snapshot_with_options, InMemoryPolicyCenter, LoadOptions};
use anyhow::{Context, Result};
use strategy_engine::{StrategyEngine, StrategyEngineBuilder};
use tracing::info;

use crate::telemetry;

/// How to assemble an engine at process start.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub policy_path: Option<PathBuf>,
    pub include_env: bool,
    pub init_tracing: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            policy_path: None,
            include_env: true,
            init_tracing: true,
        }
    }
}

impl EngineOptions {
    pub fn with_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_path = Some(path.into());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.include_env = false;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.init_tracing = false;
        self
    }
}

/// A ready engine plus the policy center backing it, for runtime overrides.
pub struct Bootstrapped {
    pub engine: Arc<dyn StrategyEngine>,
    pub policy: Arc<InMemoryPolicyCenter>,
}

pub fn bootstrap(options: &EngineOptions) -> Result<Bootstrapped> {
    if options.init_tracing {
        telemetry::init_tracing();
    }

    let load = LoadOptions {
        paths: options.policy_path.iter().cloned().collect(),
        include_env: options.include_env,
    };
    let snapshot = load_snapshot_with_options(&load).with_context(|| match &options.policy_path {
        Some(path) => format!("loading engine policy from {}", path.display()),
        None => "loading engine policy".to_string(),
    })?;
    let rev = snapshot.rev;

    let policy = Arc::new(InMemoryPolicyCenter::new(snapshot));
    let engine = StrategyEngineBuilder::new()
        .with_policy_center(policy.clone())
        .build();
    info!(
        policy_rev = rev,
        strategies = engine.strategies().len(),
        "strategy engine ready"
    );
    Ok(Bootstrapped { engine, policy })
}
