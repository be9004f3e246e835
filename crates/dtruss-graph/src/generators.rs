use std::collections::BTreeSet;

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::rng::RngHandle;
use dtruss_core::DirectedEdge;
use rand::Rng;

use crate::graph::DirectedGraph;

/// Generates a random directed graph with deterministic randomness.
///
/// `reciprocity` is the probability that a freshly drawn edge `(u, v)` is
/// accompanied by `(v, u)`, which produces bi-linked pairs.
pub fn gen_random_digraph(
    n_vertices: usize,
    n_edges: usize,
    reciprocity: f64,
    rng: &mut RngHandle,
) -> Result<DirectedGraph, TrussError> {
    let capacity = n_vertices.saturating_mul(n_vertices.saturating_sub(1));
    if n_edges > capacity {
        return Err(TrussError::Input(
            ErrorInfo::new("too-many-edges", "requested more edges than vertex pairs allow")
                .with_context("vertices", n_vertices)
                .with_context("edges", n_edges),
        ));
    }
    if !(0.0..=1.0).contains(&reciprocity) {
        return Err(TrussError::Config(
            ErrorInfo::new("invalid-reciprocity", "reciprocity must lie in [0, 1]")
                .with_context("reciprocity", reciprocity),
        ));
    }
    let mut edges = BTreeSet::new();
    while edges.len() < n_edges {
        let u = rng.gen_range(0..n_vertices as u64);
        let v = rng.gen_range(0..n_vertices as u64);
        if u == v {
            continue;
        }
        edges.insert(DirectedEdge::from_raw(u, v));
        if edges.len() < n_edges && rng.gen_bool(reciprocity) {
            edges.insert(DirectedEdge::from_raw(v, u));
        }
    }
    DirectedGraph::from_edges(edges)
}
