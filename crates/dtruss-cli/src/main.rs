use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    decompose::{self, DecomposeArgs},
    generate::{self, GenerateArgs},
    partition::{self, PartitionArgs},
    supports::{self, SupportsArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "dtruss", about = "Distributed directed truss decomposition")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute cycle and flow supports of an edge list.
    Supports(SupportsArgs),
    /// Partition an edge list and print the fragment assignment.
    Partition(PartitionArgs),
    /// Run the full decomposition on an in-process worker fleet.
    Decompose(DecomposeArgs),
    /// Write a random directed edge list.
    Generate(GenerateArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Supports(args) => supports::run(&args),
        Command::Partition(args) => partition::run(&args),
        Command::Decompose(args) => decompose::run(&args),
        Command::Generate(args) => generate::run(&args),
    }
}
