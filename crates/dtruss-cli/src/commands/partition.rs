use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use dtruss_core::{DirectedEdge, WorkerId};
use dtruss_peel::build_partition;
use serde::Serialize;
use tracing::info;

use super::{emit_json, load_config, load_graph};

#[derive(Args, Debug)]
pub struct PartitionArgs {
    /// Whitespace separated edge list.
    #[arg(long)]
    pub graph: PathBuf,
    /// YAML run configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overrides the configured worker count.
    #[arg(long)]
    pub workers: Option<usize>,
    /// Output file; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Assignment {
    edge: DirectedEdge,
    worker: WorkerId,
}

#[derive(Debug, Serialize)]
struct PartitionReport {
    workers: usize,
    fragment_sizes: Vec<usize>,
    boundary_sizes: Vec<usize>,
    assignment: Vec<Assignment>,
}

pub fn run(args: &PartitionArgs) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(&args.graph)?;
    let config = load_config(args.config.as_deref(), args.workers)?;
    let partition = build_partition(&graph, &config)?;
    partition.validate(&graph)?;
    let boundary_sizes = partition
        .fragments(&graph)?
        .iter()
        .map(|fragment| fragment.ghosts().len())
        .collect();
    info!(workers = partition.workers(), "partition written");

    let report = PartitionReport {
        workers: partition.workers(),
        fragment_sizes: partition.sizes(),
        boundary_sizes,
        assignment: partition
            .assignment()
            .iter()
            .map(|(edge, worker)| Assignment {
                edge: *edge,
                worker: *worker,
            })
            .collect(),
    };
    emit_json(&report, args.out.as_deref())
}
