use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, WorkerId};
use dtruss_graph::DirectedGraph;

/// Immutable `edge → worker` assignment produced once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    workers: usize,
    assignment: BTreeMap<DirectedEdge, WorkerId>,
}

impl Partition {
    /// Wraps an explicit assignment for `workers` workers.
    pub fn from_assignment(
        workers: usize,
        assignment: BTreeMap<DirectedEdge, WorkerId>,
    ) -> Result<Self, TrussError> {
        if workers == 0 {
            return Err(partition_error("invalid-workers", "worker count must be positive"));
        }
        if let Some((edge, worker)) = assignment.iter().find(|(_, w)| w.index() >= workers) {
            return Err(
                partition_error("worker-out-of-range", "edge assigned to a missing worker")
                    .with_context("edge", edge)
                    .with_context("worker", worker)
                    .with_context("workers", workers),
            );
        }
        Ok(Self {
            workers,
            assignment,
        })
    }

    /// Assigns every edge to a single worker.
    pub fn single(graph: &DirectedGraph) -> Self {
        Self {
            workers: 1,
            assignment: graph
                .edges()
                .iter()
                .map(|edge| (*edge, WorkerId::new(0)))
                .collect(),
        }
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Owner of `edge`, if assigned.
    pub fn owner(&self, edge: &DirectedEdge) -> Option<WorkerId> {
        self.assignment.get(edge).copied()
    }

    /// Full assignment in edge order.
    pub fn assignment(&self) -> &BTreeMap<DirectedEdge, WorkerId> {
        &self.assignment
    }

    /// Edges owned by `worker`.
    pub fn owned_by(&self, worker: WorkerId) -> BTreeSet<DirectedEdge> {
        self.assignment
            .iter()
            .filter(|(_, owner)| **owner == worker)
            .map(|(edge, _)| *edge)
            .collect()
    }

    /// Number of edges per worker.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.workers];
        for worker in self.assignment.values() {
            sizes[worker.index()] += 1;
        }
        sizes
    }

    /// Checks that the fragments are disjoint and cover exactly the edges of `graph`.
    pub fn validate(&self, graph: &DirectedGraph) -> Result<(), TrussError> {
        if let Some(edge) = graph.edges().iter().find(|e| !self.assignment.contains_key(e)) {
            return Err(partition_error("unassigned-edge", "edge belongs to no fragment")
                .with_context("edge", edge));
        }
        if let Some(edge) = self.assignment.keys().find(|e| !graph.contains(e)) {
            return Err(partition_error("unknown-edge", "assigned edge is not in the graph")
                .with_context("edge", edge));
        }
        let covered: usize = self.sizes().iter().sum();
        if covered != graph.edge_count() {
            return Err(partition_error("overlapping-fragments", "fragments are not disjoint")
                .with_context("covered", covered)
                .with_context("edges", graph.edge_count()));
        }
        Ok(())
    }

    /// Builds the fragment of `worker`: owned edges, boundary edges and the
    /// replica routing table of every owned edge.
    pub fn fragment_for(
        &self,
        graph: &DirectedGraph,
        worker: WorkerId,
    ) -> Result<Fragment, TrussError> {
        if worker.index() >= self.workers {
            return Err(
                partition_error("worker-out-of-range", "no such worker in this partition")
                    .with_context("worker", worker)
                    .with_context("workers", self.workers),
            );
        }
        let owned = self.owned_by(worker);
        let mut ghosts = BTreeMap::new();
        let mut replicas = BTreeMap::new();
        for edge in &owned {
            let mut holders = BTreeSet::new();
            for neighbour in graph.neighbourhood(edge) {
                let owner = self.owner(&neighbour).ok_or_else(|| {
                    partition_error("unassigned-edge", "edge belongs to no fragment")
                        .with_context("edge", neighbour)
                })?;
                if owner != worker {
                    holders.insert(owner);
                    ghosts.insert(neighbour, owner);
                }
            }
            replicas.insert(*edge, holders);
        }
        Ok(Fragment {
            worker,
            workers: self.workers,
            owned,
            ghosts,
            replicas,
        })
    }

    /// Builds the fragments of every worker, in rank order.
    pub fn fragments(&self, graph: &DirectedGraph) -> Result<Vec<Fragment>, TrussError> {
        (0..self.workers)
            .map(|index| self.fragment_for(graph, WorkerId::new(index)))
            .collect()
    }
}

/// Edges one worker holds: the fragment it owns plus every edge sharing an
/// endpoint with an owned edge.
///
/// Every triangle of an owned edge is visible, so supports of owned edges can
/// be computed without communication. Boundary (ghost) edges are read only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    worker: WorkerId,
    workers: usize,
    owned: BTreeSet<DirectedEdge>,
    ghosts: BTreeMap<DirectedEdge, WorkerId>,
    replicas: BTreeMap<DirectedEdge, BTreeSet<WorkerId>>,
}

impl Fragment {
    /// Worker holding the fragment.
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Number of workers in the partition the fragment was cut from.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Edges owned by the worker.
    pub fn owned(&self) -> &BTreeSet<DirectedEdge> {
        &self.owned
    }

    /// Boundary edges with their owners.
    pub fn ghosts(&self) -> &BTreeMap<DirectedEdge, WorkerId> {
        &self.ghosts
    }

    /// Owned and boundary edges.
    pub fn visible(&self) -> impl Iterator<Item = &DirectedEdge> + '_ {
        self.owned.iter().chain(self.ghosts.keys())
    }

    /// Returns whether the worker owns `edge`.
    pub fn owns(&self, edge: &DirectedEdge) -> bool {
        self.owned.contains(edge)
    }

    /// Other workers holding a copy of the owned `edge`.
    pub fn replicas(&self, edge: &DirectedEdge) -> Option<&BTreeSet<WorkerId>> {
        self.replicas.get(edge)
    }
}

fn partition_error(code: impl Into<String>, message: impl Into<String>) -> TrussError {
    TrussError::Partition(ErrorInfo::new(code, message))
}
