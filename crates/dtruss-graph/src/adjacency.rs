use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::{DirectedEdge, VertexId};

static EMPTY: BTreeSet<VertexId> = BTreeSet::new();

/// Derived out/in neighbour maps over a set of visible edges.
///
/// The two maps are independent: removing an edge updates both, and a vertex
/// disappears from a map once its last neighbour in that direction is gone.
/// Ordered sets keep every scan deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyView {
    out: BTreeMap<VertexId, BTreeSet<VertexId>>,
    inc: BTreeMap<VertexId, BTreeSet<VertexId>>,
    edge_count: usize,
}

impl AdjacencyView {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a view over the provided edges; duplicates collapse.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a DirectedEdge>) -> Self {
        let mut view = Self::new();
        for edge in edges {
            view.insert(*edge);
        }
        view
    }

    /// Inserts an edge. Returns false when it was already present.
    pub fn insert(&mut self, edge: DirectedEdge) -> bool {
        let fresh = self.out.entry(edge.source).or_default().insert(edge.target);
        if fresh {
            self.inc.entry(edge.target).or_default().insert(edge.source);
            self.edge_count += 1;
        }
        fresh
    }

    /// Removes an edge. Returns false when it was not present.
    pub fn remove(&mut self, edge: &DirectedEdge) -> bool {
        let Some(targets) = self.out.get_mut(&edge.source) else {
            return false;
        };
        if !targets.remove(&edge.target) {
            return false;
        }
        if targets.is_empty() {
            self.out.remove(&edge.source);
        }
        if let Some(sources) = self.inc.get_mut(&edge.target) {
            sources.remove(&edge.source);
            if sources.is_empty() {
                self.inc.remove(&edge.target);
            }
        }
        self.edge_count -= 1;
        true
    }

    /// Returns whether the edge is visible.
    pub fn contains(&self, edge: &DirectedEdge) -> bool {
        self.out
            .get(&edge.source)
            .map(|targets| targets.contains(&edge.target))
            .unwrap_or(false)
    }

    /// Out-neighbours of `vertex` (empty when unknown).
    pub fn out_neighbors(&self, vertex: VertexId) -> &BTreeSet<VertexId> {
        self.out.get(&vertex).unwrap_or(&EMPTY)
    }

    /// In-neighbours of `vertex` (empty when unknown).
    pub fn in_neighbors(&self, vertex: VertexId) -> &BTreeSet<VertexId> {
        self.inc.get(&vertex).unwrap_or(&EMPTY)
    }

    /// Number of visible edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns true when no edge is visible.
    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// Vertices incident to at least one visible edge.
    pub fn vertices(&self) -> BTreeSet<VertexId> {
        self.out.keys().chain(self.inc.keys()).copied().collect()
    }

    /// Iterates visible edges in lexicographic order.
    pub fn edges(&self) -> impl Iterator<Item = DirectedEdge> + '_ {
        self.out.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |target| DirectedEdge::new(*source, *target))
        })
    }

    /// Iterates the visible edges incident to `vertex`, outbound first.
    pub fn incident_edges(&self, vertex: VertexId) -> impl Iterator<Item = DirectedEdge> + '_ {
        let outbound = self
            .out_neighbors(vertex)
            .iter()
            .map(move |target| DirectedEdge::new(vertex, *target));
        let inbound = self
            .in_neighbors(vertex)
            .iter()
            .map(move |source| DirectedEdge::new(*source, vertex));
        outbound.chain(inbound)
    }
}
