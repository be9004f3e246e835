use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use dtruss_peel::decompose;

use super::{emit_json, load_config, load_graph};

#[derive(Args, Debug)]
pub struct DecomposeArgs {
    /// Whitespace separated edge list.
    #[arg(long)]
    pub graph: PathBuf,
    /// YAML run configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overrides the configured worker count.
    #[arg(long)]
    pub workers: Option<usize>,
    /// Report file; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &DecomposeArgs) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(&args.graph)?;
    let config = load_config(args.config.as_deref(), args.workers)?;
    let report = decompose(&graph, &config)?;
    emit_json(&report, args.out.as_deref())
}
