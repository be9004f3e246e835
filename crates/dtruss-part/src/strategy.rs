use dtruss_graph::TriangleKind;
use serde::{Deserialize, Serialize};

/// Partitioning strategy selected by the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PartitionStrategy {
    /// Triangle-load balanced greedy growth of fragments.
    TypeAware {
        /// Tolerated ratio between a worker's load and the minimum load.
        #[serde(default = "default_epsilon")]
        epsilon: f64,
        /// Triangle kind whose load is balanced.
        #[serde(default = "default_triangle")]
        triangle: TriangleKind,
        /// Seed of the draw order for workers with an empty candidate queue.
        #[serde(default)]
        seed: u64,
    },
    /// Trussness strata of bounded flow weight.
    Stratified,
}

fn default_epsilon() -> f64 {
    1.5
}

fn default_triangle() -> TriangleKind {
    TriangleKind::Cycle
}

impl PartitionStrategy {
    /// Returns true when the strategy consumes per-edge trussness pairs.
    pub fn needs_pairs(&self) -> bool {
        matches!(self, PartitionStrategy::Stratified)
    }

    /// Seed recorded in run provenance.
    pub fn seed(&self) -> u64 {
        match self {
            PartitionStrategy::TypeAware { seed, .. } => *seed,
            PartitionStrategy::Stratified => 0,
        }
    }
}

impl Default for PartitionStrategy {
    fn default() -> Self {
        PartitionStrategy::TypeAware {
            epsilon: default_epsilon(),
            triangle: default_triangle(),
            seed: 0,
        }
    }
}
