#![deny(missing_docs)]

//! Directed graph, adjacency view, LinkStatus table and the cycle/flow
//! support engine used by the partitioner and the peeling engine.
//!
//! For an edge `(u, v)` and a third vertex `w`, every directed triangle is
//! counted exactly once by exactly one metric:
//!
//! * cycle support: `v→w→u` closes a directed 3-cycle;
//! * flow support: the edge shortcuts `u→w→v`, or is a hop of a two-hop path
//!   shortcut through `w` (`u→v→w` with `u→w`, `w→u→v` with `w→v`).

mod adjacency;
mod generators;
mod graph;
mod hash;
mod ingest;
mod link;
mod serialization;
mod support;

pub use adjacency::AdjacencyView;
pub use generators::gen_random_digraph;
pub use graph::DirectedGraph;
pub use hash::{canonical_hash, edge_set_hash};
pub use ingest::{parse_edge_list, read_edge_list, shard_round_robin};
pub use link::{LinkStatus, LinkTable};
pub use support::{
    compute_supports, edge_supports, triangles_of_kind, triangles_with, SupportTable, Triangle,
    TriangleKind, TrianglePattern,
};

/// Re-export serialization helpers for downstream crates.
pub use serialization::{
    graph_from_bytes, graph_from_json, graph_to_bytes, graph_to_json, GRAPH_SCHEMA,
};
