use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use dtruss_core::rng::RngHandle;
use dtruss_graph::gen_random_digraph;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of vertices.
    #[arg(long)]
    pub vertices: usize,
    /// Number of directed edges.
    #[arg(long)]
    pub edges: usize,
    /// Probability that an edge comes with its reverse.
    #[arg(long, default_value_t = 0.1)]
    pub reciprocity: f64,
    /// Deterministic seed.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Output edge list.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &GenerateArgs) -> Result<(), Box<dyn Error>> {
    let mut rng = RngHandle::from_seed(args.seed);
    let graph = gen_random_digraph(args.vertices, args.edges, args.reciprocity, &mut rng)?;
    if let Some(parent) = args.out.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(&args.out)?;
    writeln!(file, "# vertices={} edges={} seed={}", args.vertices, args.edges, args.seed)?;
    for edge in graph.edges() {
        writeln!(file, "{} {}", edge.source, edge.target)?;
    }
    Ok(())
}
