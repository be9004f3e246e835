use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, WorkerId};
use tracing::debug;

/// Parses a whitespace separated `u v` edge list.
///
/// Blank lines and lines starting with `#` or `%` are skipped. Trailing
/// columns (weights, timestamps) are ignored. Any other malformed line
/// aborts the parse with its 1-based line number.
pub fn parse_edge_list<R: BufRead>(reader: R) -> Result<Vec<DirectedEdge>, TrussError> {
    let mut edges = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|err| {
            input_error("unreadable-line", err.to_string()).with_context("line", line_no)
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let source = parse_vertex(fields.next(), line_no)?;
        let target = parse_vertex(fields.next(), line_no)?;
        edges.push(DirectedEdge::from_raw(source, target));
    }
    debug!(edges = edges.len(), "parsed edge list");
    Ok(edges)
}

/// Reads and parses an edge list file.
pub fn read_edge_list(path: &Path) -> Result<Vec<DirectedEdge>, TrussError> {
    let file = File::open(path).map_err(|err| {
        input_error("unreadable-file", err.to_string()).with_context("path", path.display())
    })?;
    parse_edge_list(BufReader::new(file)).map_err(|err| err.with_context("path", path.display()))
}

/// Static round-robin shard of the input: line `i` belongs to worker `i % size`.
pub fn shard_round_robin(
    edges: &[DirectedEdge],
    rank: WorkerId,
    size: usize,
) -> Result<Vec<DirectedEdge>, TrussError> {
    if size == 0 || rank.index() >= size {
        return Err(TrussError::Config(
            ErrorInfo::new("invalid-rank", "rank must be below a non-zero fleet size")
                .with_context("rank", rank.index())
                .with_context("size", size),
        ));
    }
    Ok(edges
        .iter()
        .enumerate()
        .filter(|(idx, _)| idx % size == rank.index())
        .map(|(_, edge)| *edge)
        .collect())
}

fn parse_vertex(field: Option<&str>, line_no: usize) -> Result<u64, TrussError> {
    let field = field.ok_or_else(|| {
        input_error("malformed-line", "expected two vertex identifiers")
            .with_context("line", line_no)
    })?;
    field.parse::<u64>().map_err(|_| {
        input_error("malformed-vertex", "vertex identifier is not a non-negative integer")
            .with_context("line", line_no)
            .with_context("token", field)
    })
}

fn input_error(code: impl Into<String>, message: impl Into<String>) -> TrussError {
    TrussError::Input(ErrorInfo::new(code, message))
}
