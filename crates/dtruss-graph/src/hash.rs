use dtruss_core::DirectedEdge;
use sha2::{Digest, Sha256};

use crate::graph::DirectedGraph;
use crate::serialization::GRAPH_SCHEMA;

/// Computes the canonical structural hash for the provided graph.
///
/// Edges are hashed in lexicographic order, so two graphs with the same edge
/// set hash identically regardless of input order.
pub fn canonical_hash(graph: &DirectedGraph) -> String {
    edge_set_hash(graph.edges().iter())
}

/// Hashes an ordered sequence of edges (fragments, surviving sets).
pub fn edge_set_hash<'a>(edges: impl ExactSizeIterator<Item = &'a DirectedEdge>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"dtruss-graph");
    hasher.update(GRAPH_SCHEMA.major.to_le_bytes());
    hasher.update(GRAPH_SCHEMA.minor.to_le_bytes());
    hasher.update((edges.len() as u64).to_le_bytes());
    for edge in edges {
        hasher.update(edge.source.as_raw().to_le_bytes());
        hasher.update(edge.target.as_raw().to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}
