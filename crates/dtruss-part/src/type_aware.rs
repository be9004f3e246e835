use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::rng::RngHandle;
use dtruss_core::{DirectedEdge, WorkerId};
use dtruss_graph::{triangles_of_kind, DirectedGraph, Triangle, TriangleKind};
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::assignment::Partition;

const DRAW_ORDER_STREAM: u64 = 0x7479_7065;

/// Parameters of [`type_aware_partition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeAwareOptions {
    /// Number of workers.
    pub workers: usize,
    /// Balance tolerance, at least one.
    pub epsilon: f64,
    /// Triangle kind whose load is balanced.
    pub kind: TriangleKind,
    /// Seed of the draw order.
    pub seed: u64,
}

/// Greedy triangle-aware partitioning.
///
/// Each edge weighs one plus the number of triangles of `kind` it belongs to.
/// Workers take turns growing their fragment while their load stays under
/// the average and within `epsilon` of the lightest worker; a worker prefers
/// the candidate edge closing the most triangles with its fragment and
/// otherwise draws the next unassigned edge of a seeded permutation. When no
/// worker is eligible the lightest one takes the next edge.
pub fn type_aware_partition(
    graph: &DirectedGraph,
    options: TypeAwareOptions,
) -> Result<Partition, TrussError> {
    validate_options(&options)?;
    let triangles: BTreeMap<DirectedEdge, Vec<Triangle>> = graph
        .edges()
        .iter()
        .map(|edge| (*edge, triangles_of_kind(graph.view(), edge, options.kind)))
        .collect();
    let total_load: u64 = triangles.values().map(|t| t.len() as u64 + 1).sum();
    let capacity = total_load as f64 / options.workers as f64;

    let mut draw_order: Vec<DirectedEdge> = graph.edges().iter().copied().collect();
    draw_order.shuffle(&mut RngHandle::substream(options.seed, DRAW_ORDER_STREAM));

    let mut state = GrowthState {
        triangles: &triangles,
        draw_order,
        cursor: 0,
        loads: vec![0; options.workers],
        fragments: vec![BTreeSet::new(); options.workers],
        queues: vec![BTreeMap::new(); options.workers],
        assignment: BTreeMap::new(),
    };

    let mut forced = 0usize;
    while state.assignment.len() < graph.edge_count() {
        let mut progressed = false;
        for worker in 0..options.workers {
            if state.assignment.len() == graph.edge_count() {
                break;
            }
            let min_load = state.loads.iter().copied().min().unwrap_or(0);
            let load = state.loads[worker] as f64;
            if load < capacity && load <= options.epsilon * min_load as f64 {
                state.grow(worker);
                progressed = true;
            }
        }
        if !progressed {
            let lightest = state
                .loads
                .iter()
                .enumerate()
                .min_by_key(|(index, load)| (**load, *index))
                .map(|(index, _)| index)
                .unwrap_or(0);
            state.grow(lightest);
            forced += 1;
        }
    }

    debug!(forced, "edges assigned to the lightest worker");
    info!(
        workers = options.workers,
        edges = graph.edge_count(),
        total_load,
        "type-aware partition complete"
    );
    Partition::from_assignment(options.workers, state.assignment)
}

fn validate_options(options: &TypeAwareOptions) -> Result<(), TrussError> {
    if options.workers == 0 {
        return Err(TrussError::Partition(ErrorInfo::new(
            "invalid-workers",
            "worker count must be positive",
        )));
    }
    if !options.epsilon.is_finite() || options.epsilon < 1.0 {
        return Err(TrussError::Partition(
            ErrorInfo::new("invalid-epsilon", "balance tolerance must be at least 1")
                .with_context("epsilon", options.epsilon),
        ));
    }
    Ok(())
}

struct GrowthState<'a> {
    triangles: &'a BTreeMap<DirectedEdge, Vec<Triangle>>,
    draw_order: Vec<DirectedEdge>,
    cursor: usize,
    loads: Vec<u64>,
    fragments: Vec<BTreeSet<DirectedEdge>>,
    queues: Vec<BTreeMap<DirectedEdge, u32>>,
    assignment: BTreeMap<DirectedEdge, WorkerId>,
}

impl GrowthState<'_> {
    /// Assigns the next edge to `worker`. Callers guarantee an unassigned edge exists.
    fn grow(&mut self, worker: usize) {
        if let Some(edge) = self.next_candidate(worker).or_else(|| self.next_drawn()) {
            self.assign(edge, worker);
        }
    }

    fn next_candidate(&self, worker: usize) -> Option<DirectedEdge> {
        let mut best: Option<(DirectedEdge, u32)> = None;
        for (edge, score) in &self.queues[worker] {
            if best.map_or(true, |(_, top)| *score > top) {
                best = Some((*edge, *score));
            }
        }
        best.map(|(edge, _)| edge)
    }

    fn next_drawn(&mut self) -> Option<DirectedEdge> {
        while let Some(edge) = self.draw_order.get(self.cursor) {
            self.cursor += 1;
            if !self.assignment.contains_key(edge) {
                return Some(*edge);
            }
        }
        None
    }

    fn assign(&mut self, edge: DirectedEdge, worker: usize) {
        self.assignment.insert(edge, WorkerId::new(worker));
        self.fragments[worker].insert(edge);
        for queue in &mut self.queues {
            queue.remove(&edge);
        }
        let all = self.triangles;
        let triangles = all.get(&edge).map(Vec::as_slice).unwrap_or(&[]);
        self.loads[worker] += triangles.len() as u64 + 1;
        for triangle in triangles {
            let [first, second] = triangle.partners;
            for (partner, third) in [(first, second), (second, first)] {
                if self.assignment.contains_key(&partner) {
                    continue;
                }
                let score = self.queues[worker].entry(partner).or_insert(0);
                if self.fragments[worker].contains(&third) {
                    *score += 1;
                }
            }
        }
    }
}
