use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::provenance::SchemaVersion;
use dtruss_core::DirectedEdge;
use serde::{Deserialize, Serialize};

use crate::graph::DirectedGraph;

/// Schema version written alongside serialized graphs.
pub const GRAPH_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Serializes the graph to a compact binary representation using `bincode`.
pub fn graph_to_bytes(graph: &DirectedGraph) -> Result<Vec<u8>, TrussError> {
    let serializable = SerializableGraph::from_graph(graph);
    bincode::serialize(&serializable)
        .map_err(|err| TrussError::Serde(ErrorInfo::new("serialize-bytes", err.to_string())))
}

/// Restores a graph from its binary representation.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<DirectedGraph, TrussError> {
    let serializable: SerializableGraph = bincode::deserialize(bytes)
        .map_err(|err| TrussError::Serde(ErrorInfo::new("deserialize-bytes", err.to_string())))?;
    serializable.into_graph()
}

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &DirectedGraph) -> Result<String, TrussError> {
    let serializable = SerializableGraph::from_graph(graph);
    serde_json::to_string_pretty(&serializable)
        .map_err(|err| TrussError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<DirectedGraph, TrussError> {
    let serializable: SerializableGraph = serde_json::from_str(json)
        .map_err(|err| TrussError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))?;
    serializable.into_graph()
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableGraph {
    schema_version: SchemaVersion,
    edges: Vec<(u64, u64)>,
}

impl SerializableGraph {
    fn from_graph(graph: &DirectedGraph) -> Self {
        Self {
            schema_version: GRAPH_SCHEMA,
            edges: graph
                .edges()
                .iter()
                .map(|edge| (edge.source.as_raw(), edge.target.as_raw()))
                .collect(),
        }
    }

    fn into_graph(self) -> Result<DirectedGraph, TrussError> {
        if self.schema_version.major != GRAPH_SCHEMA.major {
            return Err(TrussError::Serde(
                ErrorInfo::new("schema-mismatch", "unsupported graph schema version")
                    .with_context("found", self.schema_version.major)
                    .with_context("expected", GRAPH_SCHEMA.major),
            ));
        }
        DirectedGraph::from_edges(
            self.edges
                .into_iter()
                .map(|(source, target)| DirectedEdge::from_raw(source, target)),
        )
    }
}
