use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use dtruss_core::{DirectedEdge, Supports, WorkerId};
use dtruss_graph::{
    canonical_hash, compute_supports, read_edge_list, shard_round_robin, DirectedGraph, LinkTable,
};
use serde::Serialize;

use super::emit_json;

#[derive(Args, Debug)]
pub struct SupportsArgs {
    /// Whitespace separated edge list.
    #[arg(long)]
    pub graph: PathBuf,
    /// Only report the round-robin shard of this rank (requires `--size`).
    #[arg(long, requires = "size")]
    pub rank: Option<usize>,
    /// Number of shards for `--rank`.
    #[arg(long, requires = "rank")]
    pub size: Option<usize>,
    /// Output file; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EdgeSupports {
    edge: DirectedEdge,
    supports: Supports,
}

#[derive(Debug, Serialize)]
struct SupportsReport {
    graph_hash: String,
    edges: usize,
    linked_pairs: usize,
    bi_linked_pairs: usize,
    cycle_triangles: u64,
    flow_triangles: u64,
    supports: Vec<EdgeSupports>,
}

pub fn run(args: &SupportsArgs) -> Result<(), Box<dyn Error>> {
    // Shards follow input line order, so cut them before the graph sorts edges.
    let lines = read_edge_list(&args.graph)?;
    let listed: Vec<DirectedEdge> = match (args.rank, args.size) {
        (Some(rank), Some(size)) => shard_round_robin(&lines, WorkerId::new(rank), size)?,
        _ => lines.clone(),
    };
    let graph = DirectedGraph::from_edges(lines)
        .map_err(|err| err.with_context("path", args.graph.display()))?;
    let table = compute_supports(graph.view(), &listed);
    let links = LinkTable::from_view(graph.view());

    let full = compute_supports(graph.view(), graph.edges());
    let (cycle, flow) = full.iter().fold((0u64, 0u64), |(c, f), (_, s)| {
        (c + u64::from(s.cycle), f + u64::from(s.flow))
    });
    let report = SupportsReport {
        graph_hash: canonical_hash(&graph),
        edges: graph.edge_count(),
        linked_pairs: links.linked_pairs(),
        bi_linked_pairs: links.bi_linked_pairs(),
        cycle_triangles: cycle / 3,
        flow_triangles: flow / 3,
        supports: table
            .iter()
            .map(|(edge, supports)| EdgeSupports {
                edge: *edge,
                supports: *supports,
            })
            .collect(),
    };
    emit_json(&report, args.out.as_deref())
}
