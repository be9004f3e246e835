use std::collections::BTreeSet;

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, VertexId};

use crate::adjacency::AdjacencyView;

/// Immutable directed graph without self loops or parallel edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectedGraph {
    edges: BTreeSet<DirectedEdge>,
    view: AdjacencyView,
}

impl DirectedGraph {
    /// Builds a graph, rejecting self loops and duplicate edges.
    pub fn from_edges(edges: impl IntoIterator<Item = DirectedEdge>) -> Result<Self, TrussError> {
        let mut graph = Self::default();
        for edge in edges {
            if edge.is_loop() {
                return Err(input_error("self-loop", "self loops are not supported")
                    .with_context("edge", edge));
            }
            if !graph.edges.insert(edge) {
                return Err(input_error("duplicate-edge", "edge appears more than once")
                    .with_context("edge", edge)
                    .with_hint("the edge set must not contain parallel edges"));
            }
            graph.view.insert(edge);
        }
        Ok(graph)
    }

    /// Builds a graph from raw `(source, target)` pairs.
    pub fn from_pairs(pairs: &[(u64, u64)]) -> Result<Self, TrussError> {
        Self::from_edges(pairs.iter().map(|(u, v)| DirectedEdge::from_raw(*u, *v)))
    }

    /// Returns the ordered edge set.
    pub fn edges(&self) -> &BTreeSet<DirectedEdge> {
        &self.edges
    }

    /// Returns the adjacency view over every edge.
    pub fn view(&self) -> &AdjacencyView {
        &self.view
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of vertices incident to at least one edge.
    pub fn vertex_count(&self) -> usize {
        self.view.vertices().len()
    }

    /// Returns whether the edge belongs to the graph.
    pub fn contains(&self, edge: &DirectedEdge) -> bool {
        self.edges.contains(edge)
    }

    /// Returns every edge sharing an endpoint with `edge`, including itself.
    pub fn neighbourhood(&self, edge: &DirectedEdge) -> BTreeSet<DirectedEdge> {
        self.endpoint_edges(&[edge.source, edge.target])
    }

    /// Returns every edge incident to one of the given vertices.
    pub fn endpoint_edges(&self, vertices: &[VertexId]) -> BTreeSet<DirectedEdge> {
        vertices
            .iter()
            .flat_map(|vertex| self.view.incident_edges(*vertex))
            .collect()
    }
}

fn input_error(code: impl Into<String>, message: impl Into<String>) -> TrussError {
    TrussError::Input(ErrorInfo::new(code, message))
}
