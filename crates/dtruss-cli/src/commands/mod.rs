use std::error::Error;
use std::fs;
use std::path::Path;

use dtruss_graph::{read_edge_list, DirectedGraph};
use dtruss_peel::RunConfig;
use serde::Serialize;

pub mod decompose;
pub mod generate;
pub mod partition;
pub mod supports;

/// Reads an edge list into a graph.
pub fn load_graph(path: &Path) -> Result<DirectedGraph, Box<dyn Error>> {
    let edges = read_edge_list(path)?;
    Ok(DirectedGraph::from_edges(edges).map_err(|err| err.with_context("path", path.display()))?)
}

/// Loads a YAML run configuration, falling back to defaults, then applies
/// the `--workers` override.
///
/// A stratified run enables the flow pre-pass unless the file says otherwise.
pub fn load_config(
    path: Option<&Path>,
    workers: Option<usize>,
) -> Result<RunConfig, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => RunConfig::from_yaml(&fs::read_to_string(path)?)
            .map_err(|err| err.with_context("path", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(workers) = workers {
        config.workers = workers;
    }
    config.validate()?;
    Ok(config)
}

/// Writes `value` as pretty JSON to `out`, or to stdout when absent.
pub fn emit_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
        }
        None => println!("{json}"),
    }
    Ok(())
}
