use std::collections::{BTreeMap, BTreeSet};
use std::thread;

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, RunProvenance, SchemaVersion, TrussnessPair, WorkerId};
use dtruss_graph::{canonical_hash, DirectedGraph};
use dtruss_part::{
    stratified_partition, type_aware_partition, Partition, PartitionStrategy, TypeAwareOptions,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::channel::ChannelTransport;
use crate::config::{EngineConfig, RunConfig, Schedule};
use crate::engine::{run_worker, WorkerOutcome};

/// Schema version of [`DecompositionReport`].
pub const REPORT_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Trussness pair of a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTrussness {
    /// The edge.
    pub edge: DirectedEdge,
    /// Its last survived thresholds.
    pub pair: TrussnessPair,
}

/// Per-worker section of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    /// Worker rank.
    pub worker: WorkerId,
    /// Edges owned at start.
    pub owned: usize,
    /// Edges peeled.
    pub peeled: usize,
    /// Edges alive at termination.
    pub survivors: usize,
    /// Supersteps executed.
    pub supersteps: u64,
    /// Flow pre-pass histogram, `flow number → edge count`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flow_strata: BTreeMap<u32, usize>,
}

/// Aggregated result of a decomposition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionReport {
    /// Report schema.
    pub schema_version: SchemaVersion,
    /// Inputs the run depended on.
    pub provenance: RunProvenance,
    /// Global `(k_c_max, k_f_max)`.
    pub maxima: TrussnessPair,
    /// Supersteps executed by the fleet.
    pub supersteps: u64,
    /// Edges per fragment.
    pub fragment_sizes: Vec<usize>,
    /// Pairs in edge order.
    pub edges: Vec<EdgeTrussness>,
    /// Edges alive at termination, in edge order.
    pub survivors: Vec<DirectedEdge>,
    /// Per-worker counters.
    pub workers: Vec<WorkerSummary>,
}

impl DecompositionReport {
    /// Pairs keyed by edge.
    pub fn pairs(&self) -> BTreeMap<DirectedEdge, TrussnessPair> {
        self.edges.iter().map(|entry| (entry.edge, entry.pair)).collect()
    }

    /// Serializes the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, TrussError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| TrussError::Serde(ErrorInfo::new("serialize-report", err.to_string())))
    }
}

/// Runs one worker thread per fragment of `partition` over an in-process mesh.
///
/// Outcomes are returned in rank order. When several workers fail, the first
/// error that is not a barrier failure is reported, since barrier failures on
/// healthy workers are a consequence of the failing one.
pub fn run_local(
    graph: &DirectedGraph,
    partition: &Partition,
    config: &EngineConfig,
) -> Result<Vec<WorkerOutcome>, TrussError> {
    config.validate()?;
    partition.validate(graph)?;
    let fragments = partition.fragments(graph)?;
    let transports = ChannelTransport::mesh_with_timeout(partition.workers(), config.sync_timeout());

    let results: Vec<Result<WorkerOutcome, TrussError>> = thread::scope(|scope| {
        let handles: Vec<_> = fragments
            .into_iter()
            .zip(transports)
            .map(|(fragment, mut transport)| {
                scope.spawn(move || run_worker(fragment, &mut transport, config))
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                handle.join().unwrap_or_else(|_| {
                    Err(TrussError::Sync(
                        ErrorInfo::new("worker-panicked", "worker thread panicked")
                            .with_context("worker", WorkerId::new(index)),
                    ))
                })
            })
            .collect()
    });

    let mut outcomes = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => errors.push(err),
        }
    }
    if errors.is_empty() {
        return Ok(outcomes);
    }
    for err in &errors {
        warn!(error = %err, "worker failed");
    }
    let root = errors
        .iter()
        .position(|err| !matches!(err, TrussError::Sync(_)))
        .unwrap_or(0);
    Err(errors.swap_remove(root))
}

/// Decomposes `graph` on a single worker and returns every edge's pair.
///
/// The schedule is forced to the sweep, so every edge receives a pair.
pub fn decompose_single(
    graph: &DirectedGraph,
    config: &EngineConfig,
) -> Result<BTreeMap<DirectedEdge, TrussnessPair>, TrussError> {
    let oracle = EngineConfig {
        schedule: Schedule::Sweep,
        flow_prepass: false,
        ..config.clone()
    };
    let mut outcomes = run_local(graph, &Partition::single(graph), &oracle)?;
    Ok(outcomes.pop().map(|outcome| outcome.pairs).unwrap_or_default())
}

/// Partitions `graph` as configured; the stratified strategy first runs the
/// single-worker decomposition to obtain trussness pairs.
pub fn build_partition(graph: &DirectedGraph, config: &RunConfig) -> Result<Partition, TrussError> {
    config.validate()?;
    match &config.partition {
        PartitionStrategy::TypeAware {
            epsilon,
            triangle,
            seed,
        } => type_aware_partition(
            graph,
            TypeAwareOptions {
                workers: config.workers,
                epsilon: *epsilon,
                kind: *triangle,
                seed: *seed,
            },
        ),
        PartitionStrategy::Stratified => {
            let pairs = decompose_single(graph, &config.engine)?;
            stratified_partition(graph, config.workers, &pairs)
        }
    }
}

/// Partitions, peels and aggregates a full decomposition run.
pub fn decompose(graph: &DirectedGraph, config: &RunConfig) -> Result<DecompositionReport, TrussError> {
    let partition = build_partition(graph, config)?;
    let outcomes = run_local(graph, &partition, &config.engine)?;

    let mut pairs = BTreeMap::new();
    let mut survivors = BTreeSet::new();
    let mut maxima = TrussnessPair::default();
    let mut supersteps = 0;
    let mut workers = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        maxima = maxima.max_components(outcome.maxima);
        supersteps = supersteps.max(outcome.supersteps);
        workers.push(WorkerSummary {
            worker: outcome.worker,
            owned: outcome.owned,
            peeled: outcome.peeled(),
            survivors: outcome.survivors.len(),
            supersteps: outcome.supersteps,
            flow_strata: outcome
                .flow
                .map(|flow| flow.strata)
                .unwrap_or_default(),
        });
        pairs.extend(outcome.pairs);
        survivors.extend(outcome.survivors);
    }
    info!(
        workers = config.workers,
        edges = graph.edge_count(),
        %maxima,
        supersteps,
        "decomposition complete"
    );

    Ok(DecompositionReport {
        schema_version: REPORT_SCHEMA,
        provenance: provenance(graph, config)?,
        maxima,
        supersteps,
        fragment_sizes: partition.sizes(),
        edges: pairs
            .into_iter()
            .map(|(edge, pair)| EdgeTrussness { edge, pair })
            .collect(),
        survivors: survivors.into_iter().collect(),
        workers,
    })
}

fn provenance(graph: &DirectedGraph, config: &RunConfig) -> Result<RunProvenance, TrussError> {
    let encoded = serde_json::to_vec(config)
        .map_err(|err| TrussError::Serde(ErrorInfo::new("serialize-config", err.to_string())))?;
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert("dtruss-peel".to_string(), env!("CARGO_PKG_VERSION").to_string());
    Ok(RunProvenance {
        config_hash: format!("{:x}", Sha256::digest(&encoded)),
        graph_hash: canonical_hash(graph),
        seed: config.partition.seed(),
        workers: config.workers,
        tool_versions,
    })
}
