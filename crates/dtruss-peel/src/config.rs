use std::time::Duration;

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::TrussnessPair;
use dtruss_part::PartitionStrategy;
use serde::{Deserialize, Serialize};

/// How thresholds evolve after each global fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Schedule {
    /// Peel once to the fixed point of the given thresholds.
    Fixed {
        /// Cycle-support threshold.
        k_c: u32,
        /// Flow-support threshold.
        k_f: u32,
    },
    /// Two passes over the full fragment: raise `k_c` from zero with `k_f`
    /// at zero until every edge is peeled, then the same for `k_f`.
    Sweep,
}

/// One peeling pass of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pass {
    /// A single fixed point at explicit thresholds.
    Fixed(TrussnessPair),
    /// Raises the cycle threshold level by level.
    Cycle,
    /// Raises the flow threshold level by level.
    Flow,
}

impl Pass {
    /// Thresholds at `level`.
    pub fn thresholds(&self, level: u32) -> TrussnessPair {
        match self {
            Pass::Fixed(pair) => *pair,
            Pass::Cycle => TrussnessPair::new(level, 0),
            Pass::Flow => TrussnessPair::new(0, level),
        }
    }

    /// Records a fixed point at `level` into `pair`.
    pub fn record(&self, level: u32, pair: &mut TrussnessPair) {
        match self {
            Pass::Fixed(thresholds) => *pair = *thresholds,
            Pass::Cycle => pair.k_c = level,
            Pass::Flow => pair.k_f = level,
        }
    }
}

impl Schedule {
    /// Passes run in order, each on a fresh copy of the fragment.
    pub fn passes(&self) -> Vec<Pass> {
        match self {
            Schedule::Fixed { k_c, k_f } => vec![Pass::Fixed(TrussnessPair::new(*k_c, *k_f))],
            Schedule::Sweep => vec![Pass::Cycle, Pass::Flow],
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::Sweep
    }
}

/// Options of the peeling engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Threshold schedule.
    #[serde(default)]
    pub schedule: Schedule,
    /// Run the local flow decomposition before peeling.
    #[serde(default)]
    pub flow_prepass: bool,
    /// How long a worker waits for its peers at a barrier.
    #[serde(default = "default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
    /// Upper bound on supersteps; derived from the edge count when absent.
    #[serde(default)]
    pub max_supersteps: Option<u64>,
}

fn default_sync_timeout_ms() -> u64 {
    30_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schedule: Schedule::default(),
            flow_prepass: false,
            sync_timeout_ms: default_sync_timeout_ms(),
            max_supersteps: None,
        }
    }
}

impl EngineConfig {
    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), TrussError> {
        if self.sync_timeout_ms == 0 {
            return Err(config_error("invalid-timeout", "sync timeout must be positive"));
        }
        if self.max_supersteps == Some(0) {
            return Err(config_error(
                "invalid-superstep-limit",
                "superstep limit must be positive",
            ));
        }
        Ok(())
    }

    /// Barrier timeout.
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    /// Superstep limit for a graph of `edges` edges.
    ///
    /// A pass spends at most one superstep per peeled edge plus one per level,
    /// and levels stop one above the largest support, so two passes stay well
    /// below the derived bound.
    pub fn superstep_limit(&self, edges: u64) -> u64 {
        self.max_supersteps
            .unwrap_or_else(|| edges.saturating_mul(4).saturating_add(8))
    }
}

/// Complete configuration of a decomposition run, as read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Partitioning strategy.
    #[serde(default)]
    pub partition: PartitionStrategy,
    /// Engine options.
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_workers() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            partition: PartitionStrategy::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parses a YAML run configuration.
    ///
    /// The stratified strategy turns the flow pre-pass on unless the file
    /// sets `engine.flow_prepass` itself.
    pub fn from_yaml(text: &str) -> Result<Self, TrussError> {
        let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(yaml_error)?;
        let prepass_set = value
            .get("engine")
            .and_then(|engine| engine.get("flow_prepass"))
            .is_some();
        let mut config: RunConfig = serde_yaml::from_value(value).map_err(yaml_error)?;
        if !prepass_set && matches!(config.partition, PartitionStrategy::Stratified) {
            config.engine.flow_prepass = true;
        }
        Ok(config)
    }

    /// Rejects settings no run can start with.
    pub fn validate(&self) -> Result<(), TrussError> {
        if self.workers == 0 {
            return Err(config_error("invalid-workers", "worker count must be positive"));
        }
        self.engine.validate()
    }
}

fn yaml_error(err: serde_yaml::Error) -> TrussError {
    TrussError::Serde(ErrorInfo::new("parse-config", err.to_string()))
}

fn config_error(code: impl Into<String>, message: impl Into<String>) -> TrussError {
    TrussError::Config(ErrorInfo::new(code, message))
}
