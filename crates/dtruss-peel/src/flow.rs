use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::errors::TrussError;
use dtruss_core::{DirectedEdge, Supports};
use dtruss_graph::{triangles_of_kind, AdjacencyView, SupportTable, TriangleKind};
use dtruss_part::Fragment;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Local flow numbers of the owned edges that close flow triangles among
/// themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDecomposition {
    /// Highest flow threshold each candidate edge survived.
    #[serde(skip)]
    pub numbers: BTreeMap<DirectedEdge, u32>,
    /// Number of candidate edges per flow number.
    pub strata: BTreeMap<u32, usize>,
}

/// Peels the owned flow subgraph of `fragment` level by level.
///
/// Candidates are owned edges in at least one flow triangle whose three edges
/// are all owned. For `k = 0, 1, 2, …` edges with fewer than `k` flow
/// triangles are peeled until none remain below `k`; survivors get flow
/// number `k`. No communication is involved.
///
/// The result is reported only: the peeling passes start from the exact
/// supports of the full view and never read these numbers.
pub fn flow_decomposition(fragment: &Fragment) -> Result<FlowDecomposition, TrussError> {
    let owned_view = AdjacencyView::from_edges(fragment.owned());
    let candidates: BTreeSet<DirectedEdge> = fragment
        .owned()
        .iter()
        .filter(|edge| !triangles_of_kind(&owned_view, edge, TriangleKind::Flow).is_empty())
        .copied()
        .collect();

    let mut view = AdjacencyView::from_edges(&candidates);
    let mut supports = SupportTable::new();
    for edge in &candidates {
        let flow = triangles_of_kind(&view, edge, TriangleKind::Flow).len() as u32;
        supports.set(*edge, Supports::new(0, flow));
    }

    let mut alive = candidates;
    let mut numbers = BTreeMap::new();
    let mut level = 0u32;
    while !alive.is_empty() {
        loop {
            let doomed: Vec<DirectedEdge> = alive
                .iter()
                .filter(|edge| supports.get(edge).map_or(true, |s| s.flow < level))
                .copied()
                .collect();
            if doomed.is_empty() {
                break;
            }
            for edge in &doomed {
                for triangle in triangles_of_kind(&view, edge, TriangleKind::Flow) {
                    for partner in &triangle.partners {
                        if alive.contains(partner) {
                            supports.decrement(partner, TriangleKind::Flow)?;
                        }
                    }
                }
                view.remove(edge);
                alive.remove(edge);
            }
        }
        for edge in &alive {
            numbers.insert(*edge, level);
        }
        level += 1;
    }

    let mut strata = BTreeMap::new();
    for number in numbers.values() {
        *strata.entry(*number).or_insert(0) += 1;
    }
    debug!(
        worker = %fragment.worker(),
        candidates = numbers.len(),
        levels = strata.len(),
        "flow decomposition complete"
    );
    Ok(FlowDecomposition { numbers, strata })
}
