use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, Supports, VertexId};
use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyView;
use crate::link::LinkStatus;

/// Family of directed triangles counted by a support metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriangleKind {
    /// Directed 3-cycle `u→v→w→u`.
    Cycle,
    /// Transitive triangle: one edge shortcuts a two-hop path.
    Flow,
}

/// Position of the apex `w` relative to the edge `(u, v)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrianglePattern {
    /// `v→w` and `w→u`: the edge closes a directed 3-cycle.
    Cycle,
    /// `u→w` and `w→v`: the edge shortcuts the path `u→w→v`.
    Shortcut,
    /// `v→w` and `u→w`: the edge is the first hop of `u→v→w`, shortcut by `u→w`.
    OutHop,
    /// `w→u` and `w→v`: the edge is the second hop of `w→u→v`, shortcut by `w→v`.
    InHop,
}

impl TrianglePattern {
    /// All patterns, in scan order.
    pub const ALL: [TrianglePattern; 4] = [
        TrianglePattern::Cycle,
        TrianglePattern::Shortcut,
        TrianglePattern::OutHop,
        TrianglePattern::InHop,
    ];

    /// Support metric the pattern contributes to.
    pub fn kind(&self) -> TriangleKind {
        match self {
            TrianglePattern::Cycle => TriangleKind::Cycle,
            _ => TriangleKind::Flow,
        }
    }

    /// Patterns to scan when the pair of a removed edge had `status`.
    ///
    /// Only presence matters: `Uni` and `Bi` run the same four scans, since
    /// triangles are keyed by direction and the reverse edge of a bi-linked
    /// pair keeps its own triangles. `None` means the edge is already gone
    /// and nothing is scanned.
    pub fn removal_plan(status: LinkStatus) -> &'static [TrianglePattern] {
        match status {
            LinkStatus::None => &[],
            LinkStatus::Uni | LinkStatus::Bi => &Self::ALL,
        }
    }

    fn scan_sets<'a>(
        &self,
        view: &'a AdjacencyView,
        edge: &DirectedEdge,
    ) -> (&'a BTreeSet<VertexId>, &'a BTreeSet<VertexId>) {
        let (u, v) = (edge.source, edge.target);
        match self {
            TrianglePattern::Cycle => (view.in_neighbors(u), view.out_neighbors(v)),
            TrianglePattern::Shortcut => (view.out_neighbors(u), view.in_neighbors(v)),
            TrianglePattern::OutHop => (view.out_neighbors(u), view.out_neighbors(v)),
            TrianglePattern::InHop => (view.in_neighbors(u), view.in_neighbors(v)),
        }
    }

    fn partners(&self, edge: &DirectedEdge, apex: VertexId) -> [DirectedEdge; 2] {
        let (u, v, w) = (edge.source, edge.target, apex);
        match self {
            TrianglePattern::Cycle => [DirectedEdge::new(v, w), DirectedEdge::new(w, u)],
            TrianglePattern::Shortcut => [DirectedEdge::new(u, w), DirectedEdge::new(w, v)],
            TrianglePattern::OutHop => [DirectedEdge::new(u, w), DirectedEdge::new(v, w)],
            TrianglePattern::InHop => [DirectedEdge::new(w, u), DirectedEdge::new(w, v)],
        }
    }
}

/// A directed triangle seen from one of its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triangle {
    /// How the apex closes the triangle.
    pub pattern: TrianglePattern,
    /// Third vertex.
    pub apex: VertexId,
    /// The two other edges of the triangle.
    pub partners: [DirectedEdge; 2],
}

/// Enumerates the triangles of `edge` matching `pattern` over `view`.
///
/// The edge itself does not need to be present in the view.
pub fn triangles_with(
    view: &AdjacencyView,
    edge: &DirectedEdge,
    pattern: TrianglePattern,
) -> Vec<Triangle> {
    let (left, right) = pattern.scan_sets(view, edge);
    left.intersection(right)
        .filter(|apex| !edge.touches(**apex))
        .map(|apex| Triangle {
            pattern,
            apex: *apex,
            partners: pattern.partners(edge, *apex),
        })
        .collect()
}

/// Enumerates every triangle of `edge` contributing to `kind`.
pub fn triangles_of_kind(
    view: &AdjacencyView,
    edge: &DirectedEdge,
    kind: TriangleKind,
) -> Vec<Triangle> {
    TrianglePattern::ALL
        .iter()
        .filter(|pattern| pattern.kind() == kind)
        .flat_map(|pattern| triangles_with(view, edge, *pattern))
        .collect()
}

/// Exact supports of a single edge over `view`.
pub fn edge_supports(view: &AdjacencyView, edge: &DirectedEdge) -> Supports {
    let mut supports = Supports::default();
    for pattern in TrianglePattern::ALL {
        let (left, right) = pattern.scan_sets(view, edge);
        let count = left
            .intersection(right)
            .filter(|apex| !edge.touches(**apex))
            .count() as u32;
        match pattern.kind() {
            TriangleKind::Cycle => supports.cycle += count,
            TriangleKind::Flow => supports.flow += count,
        }
    }
    supports
}

/// Computes supports from scratch for the listed edges over `view`.
///
/// The result only depends on the set of visible edges, never on the order
/// in which they were inserted or listed.
pub fn compute_supports<'a>(
    view: &AdjacencyView,
    edges: impl IntoIterator<Item = &'a DirectedEdge>,
) -> SupportTable {
    let mut table = SupportTable::new();
    for edge in edges {
        table.set(*edge, edge_supports(view, edge));
    }
    table
}

/// Stored supports of the edges held by one worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportTable {
    entries: BTreeMap<DirectedEdge, Supports>,
}

impl SupportTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supports of `edge`, if held.
    pub fn get(&self, edge: &DirectedEdge) -> Option<Supports> {
        self.entries.get(edge).copied()
    }

    /// Inserts or overwrites the supports of `edge`.
    pub fn set(&mut self, edge: DirectedEdge, supports: Supports) {
        self.entries.insert(edge, supports);
    }

    /// Returns whether the table holds `edge`.
    pub fn contains(&self, edge: &DirectedEdge) -> bool {
        self.entries.contains_key(edge)
    }

    /// Drops the entry of `edge`, returning its last supports.
    pub fn remove(&mut self, edge: &DirectedEdge) -> Option<Supports> {
        self.entries.remove(edge)
    }

    /// Overwrites held entries with peer supplied values (last write wins).
    ///
    /// Updates for edges the table does not hold are ignored. Returns how many
    /// held entries changed value.
    pub fn reconcile<'a>(
        &mut self,
        updates: impl IntoIterator<Item = &'a (DirectedEdge, Supports)>,
    ) -> usize {
        let mut changed = 0;
        for (edge, supports) in updates {
            if let Some(entry) = self.entries.get_mut(edge) {
                if entry != supports {
                    *entry = *supports;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Decrements one support counter of `edge` by one.
    pub fn decrement(&mut self, edge: &DirectedEdge, kind: TriangleKind) -> Result<(), TrussError> {
        let entry = self.entries.get_mut(edge).ok_or_else(|| {
            TrussError::Graph(
                ErrorInfo::new("unknown-edge", "edge has no stored supports")
                    .with_context("edge", edge),
            )
        })?;
        let counter = match kind {
            TriangleKind::Cycle => &mut entry.cycle,
            TriangleKind::Flow => &mut entry.flow,
        };
        *counter = counter.checked_sub(1).ok_or_else(|| {
            TrussError::Graph(
                ErrorInfo::new("support-underflow", "support would become negative")
                    .with_context("edge", edge)
                    .with_context("kind", format!("{kind:?}")),
            )
        })?;
        Ok(())
    }

    /// Number of held entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the table holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in edge order.
    pub fn iter(&self) -> impl Iterator<Item = (&DirectedEdge, &Supports)> {
        self.entries.iter()
    }
}
