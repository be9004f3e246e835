use std::collections::BTreeMap;

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, VertexId};
use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyView;

/// Number of directed edges currently connecting an unordered vertex pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStatus {
    /// No edge in either direction.
    None,
    /// Exactly one direction is present.
    Uni,
    /// Both directions are present.
    Bi,
}

impl LinkStatus {
    fn from_count(count: usize) -> Self {
        match count {
            0 => LinkStatus::None,
            1 => LinkStatus::Uni,
            _ => LinkStatus::Bi,
        }
    }

    /// Status after one of the directions has been removed.
    pub fn downgraded(self) -> Self {
        match self {
            LinkStatus::Bi => LinkStatus::Uni,
            LinkStatus::Uni | LinkStatus::None => LinkStatus::None,
        }
    }
}

/// Per-worker table of [`LinkStatus`] keyed by unordered vertex pair.
///
/// Pairs absent from the table are [`LinkStatus::None`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: BTreeMap<(VertexId, VertexId), LinkStatus>,
}

impl LinkTable {
    /// Derives the table from the edges of a view.
    pub fn from_view(view: &AdjacencyView) -> Self {
        let mut links = BTreeMap::new();
        for edge in view.edges() {
            let (a, b) = edge.pair();
            let count = usize::from(view.contains(&DirectedEdge::new(a, b)))
                + usize::from(view.contains(&DirectedEdge::new(b, a)));
            links.insert((a, b), LinkStatus::from_count(count));
        }
        Self { links }
    }

    /// Status of the pair spanned by `edge` (orientation is ignored).
    pub fn status(&self, edge: &DirectedEdge) -> LinkStatus {
        self.links
            .get(&edge.pair())
            .copied()
            .unwrap_or(LinkStatus::None)
    }

    /// Records the removal of one direction of the pair spanned by `edge`.
    ///
    /// Returns the status before the removal. Removing from a pair that is
    /// already unlinked is an error: it means an edge was removed twice.
    pub fn record_removal(&mut self, edge: &DirectedEdge) -> Result<LinkStatus, TrussError> {
        let key = edge.pair();
        let previous = self.links.get(&key).copied().unwrap_or(LinkStatus::None);
        if previous == LinkStatus::None {
            return Err(TrussError::Graph(
                ErrorInfo::new("unlinked-pair", "pair has no edge left to remove")
                    .with_context("edge", edge),
            ));
        }
        match previous.downgraded() {
            LinkStatus::None => {
                self.links.remove(&key);
            }
            next => {
                self.links.insert(key, next);
            }
        }
        Ok(previous)
    }

    /// Number of linked pairs.
    pub fn linked_pairs(&self) -> usize {
        self.links.len()
    }

    /// Number of pairs linked in both directions.
    pub fn bi_linked_pairs(&self) -> usize {
        self.links
            .values()
            .filter(|status| **status == LinkStatus::Bi)
            .count()
    }
}
