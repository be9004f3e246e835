use std::collections::BTreeSet;

use dtruss_core::errors::TrussError;
use dtruss_core::{DirectedEdge, Supports, TrussnessPair, WorkerId};
use dtruss_graph::{
    compute_supports, triangles_with, AdjacencyView, LinkTable, SupportTable, TrianglePattern,
};
use dtruss_part::Fragment;

/// Mutable peeling state of one worker, scoped to one decomposition run.
///
/// The view holds every edge of the fragment that has not been removed yet.
/// Supports of owned edges are exact over that view; supports of boundary
/// edges are snapshots taken at reconciliation and never decremented.
#[derive(Debug, Clone)]
pub struct WorkerState {
    fragment: Fragment,
    view: AdjacencyView,
    links: LinkTable,
    supports: SupportTable,
    alive: BTreeSet<DirectedEdge>,
}

impl WorkerState {
    /// Builds the view and link table of the fragment and computes supports.
    pub fn new(fragment: Fragment) -> Self {
        let view = AdjacencyView::from_edges(fragment.visible());
        let links = LinkTable::from_view(&view);
        let supports = compute_supports(&view, fragment.visible());
        let alive = fragment.owned().clone();
        Self {
            fragment,
            view,
            links,
            supports,
            alive,
        }
    }

    /// Rank of the owning worker.
    pub fn worker(&self) -> WorkerId {
        self.fragment.worker()
    }

    /// Supports of an edge held by the worker.
    pub fn supports(&self, edge: &DirectedEdge) -> Option<Supports> {
        self.supports.get(edge)
    }

    /// Owned edges not yet peeled.
    pub fn alive(&self) -> &BTreeSet<DirectedEdge> {
        &self.alive
    }

    /// Owned supports that `peer` holds a replica of.
    pub fn supports_for(&self, peer: WorkerId) -> Vec<(DirectedEdge, Supports)> {
        self.alive
            .iter()
            .filter(|edge| self.routes_to(edge, peer))
            .filter_map(|edge| self.supports.get(edge).map(|supports| (*edge, supports)))
            .collect()
    }

    /// Overwrites replica supports with values sent by their owners.
    pub fn reconcile(&mut self, updates: &[(DirectedEdge, Supports)]) -> usize {
        let foreign: Vec<(DirectedEdge, Supports)> = updates
            .iter()
            .filter(|(edge, _)| !self.fragment.owns(edge))
            .copied()
            .collect();
        self.supports.reconcile(&foreign)
    }

    /// Owned alive edges failing `thresholds`.
    pub fn candidates(&self, thresholds: TrussnessPair) -> Vec<DirectedEdge> {
        self.alive
            .iter()
            .filter(|edge| {
                self.supports
                    .get(edge)
                    .map_or(true, |supports| !supports.meets(thresholds))
            })
            .copied()
            .collect()
    }

    /// Peeled edges `peer` holds a replica of.
    pub fn routed(&self, peeled: &[DirectedEdge], peer: WorkerId) -> Vec<DirectedEdge> {
        peeled
            .iter()
            .filter(|edge| self.routes_to(edge, peer))
            .copied()
            .collect()
    }

    fn routes_to(&self, edge: &DirectedEdge, peer: WorkerId) -> bool {
        self.fragment
            .replicas(edge)
            .map_or(false, |holders| holders.contains(&peer))
    }

    /// Removes `edge` from the view and discounts its triangles.
    ///
    /// Each triangle still present in the view loses one support on each
    /// owned alive partner; the edge then leaves the view, so a triangle is
    /// discounted once even when several of its edges go in one superstep.
    /// Returns false when the edge was already removed.
    pub fn remove(&mut self, edge: &DirectedEdge) -> Result<bool, TrussError> {
        if !self.view.contains(edge) {
            return Ok(false);
        }
        let status = self.links.record_removal(edge)?;
        for pattern in TrianglePattern::removal_plan(status) {
            for triangle in triangles_with(&self.view, edge, *pattern) {
                for partner in &triangle.partners {
                    if self.alive.contains(partner) {
                        self.supports.decrement(partner, pattern.kind())?;
                    }
                }
            }
        }
        self.view.remove(edge);
        self.alive.remove(edge);
        self.supports.remove(edge);
        Ok(true)
    }

    /// Sum of cycle and flow supports over owned alive edges.
    pub fn support_totals(&self) -> (u64, u64) {
        self.alive
            .iter()
            .filter_map(|edge| self.supports.get(edge))
            .fold((0, 0), |(cycle, flow), supports| {
                (cycle + u64::from(supports.cycle), flow + u64::from(supports.flow))
            })
    }
}
