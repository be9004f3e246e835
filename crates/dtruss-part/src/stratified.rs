use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, TrussnessPair, WorkerId};
use dtruss_graph::DirectedGraph;
use tracing::{debug, info, warn};

use crate::assignment::Partition;

/// Cuts the edge set into trussness strata of bounded flow weight.
///
/// The budget is `B_max = Σ k_f / workers`. For every cycle threshold
/// `k_j = 1..=k_c_max`, while fewer than `workers - 1` fragments are filled,
/// the stratum `{e unassigned : k_f(e) ≤ k_l ∧ k_c(e) ≥ k_j}` with the largest
/// flow threshold `k_l` that is non-empty and within budget becomes the next
/// fragment. Every remaining edge goes to the last worker; fragments between
/// the last stratum and the last worker stay empty.
pub fn stratified_partition(
    graph: &DirectedGraph,
    workers: usize,
    pairs: &BTreeMap<DirectedEdge, TrussnessPair>,
) -> Result<Partition, TrussError> {
    if workers == 0 {
        return Err(TrussError::Partition(ErrorInfo::new(
            "invalid-workers",
            "worker count must be positive",
        )));
    }
    let mut weighted = BTreeMap::new();
    for edge in graph.edges() {
        let pair = pairs.get(edge).copied().ok_or_else(|| {
            TrussError::Input(
                ErrorInfo::new("missing-trussness", "edge has no trussness pair")
                    .with_context("edge", edge)
                    .with_hint("run a single-worker decomposition first"),
            )
        })?;
        weighted.insert(*edge, pair);
    }

    let total_flow: u64 = weighted.values().map(|pair| u64::from(pair.k_f)).sum();
    let budget = total_flow / workers as u64;
    let maxima = weighted
        .values()
        .fold(TrussnessPair::default(), |acc, pair| acc.max_components(*pair));

    let mut unassigned: BTreeSet<DirectedEdge> = weighted.keys().copied().collect();
    let mut assignment = BTreeMap::new();
    let mut filled = 0usize;
    for k_j in 1..=maxima.k_c {
        if filled + 1 >= workers {
            break;
        }
        let mut chosen: Option<Vec<DirectedEdge>> = None;
        for k_l in 1..=maxima.k_f.max(1) {
            let stratum: Vec<DirectedEdge> = unassigned
                .iter()
                .filter(|edge| {
                    let pair = weighted[*edge];
                    pair.k_f <= k_l && pair.k_c >= k_j
                })
                .copied()
                .collect();
            let weight: u64 = stratum.iter().map(|e| u64::from(weighted[e].k_f)).sum();
            if weight > budget {
                break;
            }
            if !stratum.is_empty() {
                chosen = Some(stratum);
            }
        }
        if let Some(stratum) = chosen {
            debug!(k_j, fragment = filled, edges = stratum.len(), "stratum filled");
            for edge in stratum {
                unassigned.remove(&edge);
                assignment.insert(edge, WorkerId::new(filled));
            }
            filled += 1;
        }
    }

    if filled + 1 < workers {
        warn!(filled, workers, "fewer strata than workers, middle fragments stay empty");
    }
    let last = WorkerId::new(workers - 1);
    let residual = unassigned.len();
    for edge in unassigned {
        assignment.insert(edge, last);
    }
    info!(
        workers,
        budget,
        strata = filled,
        residual,
        "stratified partition complete"
    );
    Partition::from_assignment(workers, assignment)
}
