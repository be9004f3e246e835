use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, ReduceOp, Transport, TrussnessPair, WorkerId};
use dtruss_part::Fragment;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::config::{EngineConfig, Pass};
use crate::flow::{flow_decomposition, FlowDecomposition};
use crate::message::SyncMessage;
use crate::worker::WorkerState;

/// Per-superstep counters of one worker, recorded after the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperstepStats {
    /// Superstep index, starting at one.
    pub superstep: u64,
    /// Index of the schedule pass the superstep belongs to.
    pub pass: usize,
    /// Thresholds in force.
    pub thresholds: TrussnessPair,
    /// Owned edges peeled by this worker.
    pub peeled: usize,
    /// Owned edges still alive afterwards.
    pub alive: usize,
    /// Sum of cycle supports over alive owned edges.
    pub cycle_total: u64,
    /// Sum of flow supports over alive owned edges.
    pub flow_total: u64,
}

/// Result of one worker's run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerOutcome {
    /// Worker rank.
    pub worker: WorkerId,
    /// Number of owned edges at start.
    pub owned: usize,
    /// Pair of every owned edge that reached a fixed point.
    pub pairs: BTreeMap<DirectedEdge, TrussnessPair>,
    /// Owned edges alive at the end of the last pass.
    pub survivors: BTreeSet<DirectedEdge>,
    /// Global `(k_c_max, k_f_max)`.
    pub maxima: TrussnessPair,
    /// Supersteps executed, reconciliation rounds included.
    pub supersteps: u64,
    /// Per-superstep counters.
    pub trace: Vec<SuperstepStats>,
    /// Result of the local flow pre-pass, when enabled.
    pub flow: Option<FlowDecomposition>,
}

impl WorkerOutcome {
    /// Owned edges peeled by the last pass.
    pub fn peeled(&self) -> usize {
        self.owned - self.survivors.len()
    }
}

/// Runs every pass of the schedule for one worker.
///
/// Every worker of the fleet must call this with its own fragment and
/// transport; all of them perform the same sequence of barriers.
pub fn run_worker<T: Transport>(
    fragment: Fragment,
    transport: &mut T,
    config: &EngineConfig,
) -> Result<WorkerOutcome, TrussError> {
    config.validate()?;
    let rank = transport.rank();
    if fragment.worker() != rank || fragment.workers() != transport.size() {
        return Err(TrussError::Config(
            ErrorInfo::new("rank-mismatch", "fragment was cut for another worker")
                .with_context("rank", rank)
                .with_context("fragment", fragment.worker())
                .with_context("size", transport.size()),
        ));
    }
    let span = info_span!("worker", rank = %rank);
    let _guard = span.enter();

    let flow = if config.flow_prepass {
        Some(flow_decomposition(&fragment)?)
    } else {
        None
    };
    let total_edges = transport.global_reduce(fragment.owned().len() as u64, ReduceOp::Sum)?;
    let mut run = PassRunner {
        transport,
        rank,
        limit: config.superstep_limit(total_edges),
        superstep: 0,
        pairs: BTreeMap::new(),
        trace: Vec::new(),
    };
    let mut survivors = BTreeSet::new();
    for (index, pass) in config.schedule.passes().into_iter().enumerate() {
        let state = run.run_pass(WorkerState::new(fragment.clone()), index, pass)?;
        survivors = state.alive().clone();
    }

    // DONE
    let local = run
        .pairs
        .values()
        .fold(TrussnessPair::default(), |acc, pair| acc.max_components(*pair));
    let maxima = TrussnessPair::new(
        reduce_u32(run.transport, local.k_c, ReduceOp::Max)?,
        reduce_u32(run.transport, local.k_f, ReduceOp::Max)?,
    );
    info!(supersteps = run.superstep, %maxima, survivors = survivors.len(), "peeling finished");

    Ok(WorkerOutcome {
        worker: rank,
        owned: fragment.owned().len(),
        pairs: run.pairs,
        survivors,
        maxima,
        supersteps: run.superstep,
        trace: run.trace,
        flow,
    })
}

struct PassRunner<'t, T> {
    transport: &'t mut T,
    rank: WorkerId,
    limit: u64,
    superstep: u64,
    pairs: BTreeMap<DirectedEdge, TrussnessPair>,
    trace: Vec<SuperstepStats>,
}

impl<T: Transport> PassRunner<'_, T> {
    fn peers(&self) -> Vec<WorkerId> {
        (0..self.transport.size())
            .map(WorkerId::new)
            .filter(|peer| *peer != self.rank)
            .collect()
    }

    fn advance(&mut self) -> Result<u64, TrussError> {
        self.superstep += 1;
        if self.superstep > self.limit {
            return Err(TrussError::Sync(
                ErrorInfo::new("superstep-limit", "peeling did not converge")
                    .with_context("worker", self.rank)
                    .with_context("limit", self.limit)
                    .with_hint("raise `max_supersteps`"),
            ));
        }
        Ok(self.superstep)
    }

    /// Peels `state` level by level until the pass converges.
    fn run_pass(
        &mut self,
        mut state: WorkerState,
        index: usize,
        pass: Pass,
    ) -> Result<WorkerState, TrussError> {
        // INIT: owners publish authoritative supports to replica holders.
        let superstep = self.advance()?;
        let outbound = self
            .peers()
            .into_iter()
            .map(|peer| {
                let supports = state.supports_for(peer);
                (peer, SyncMessage::supports(superstep, self.rank, supports))
            })
            .collect();
        let mut reconciled = 0;
        for message in exchange(self.transport, superstep, outbound)? {
            reconciled += state.reconcile(&message.supports);
        }
        debug!(pass = index, alive = state.alive().len(), reconciled, "pass initialized");

        let mut level = 0u32;
        loop {
            let thresholds = pass.thresholds(level);
            let superstep = self.advance()?;

            // PEEL + UPDATE, local removals first.
            let peeled = state.candidates(thresholds);
            for edge in &peeled {
                state.remove(edge)?;
            }

            // SYNC
            let outbound = self
                .peers()
                .into_iter()
                .map(|peer| {
                    let routed = state.routed(&peeled, peer);
                    (peer, SyncMessage::peeled(superstep, self.rank, routed))
                })
                .collect();
            for message in exchange(self.transport, superstep, outbound)? {
                for edge in &message.peeled {
                    state.remove(edge)?;
                }
            }

            let (cycle_total, flow_total) = state.support_totals();
            self.trace.push(SuperstepStats {
                superstep,
                pass: index,
                thresholds,
                peeled: peeled.len(),
                alive: state.alive().len(),
                cycle_total,
                flow_total,
            });
            debug!(superstep, %thresholds, peeled = peeled.len(), alive = state.alive().len(), "superstep");

            // CHECK
            let changed =
                self.transport.global_reduce(u64::from(!peeled.is_empty()), ReduceOp::Or)?;
            if changed != 0 {
                continue;
            }
            for edge in state.alive() {
                pass.record(level, self.pairs.entry(*edge).or_default());
            }
            if matches!(pass, Pass::Fixed(_)) {
                return Ok(state);
            }
            let alive = self
                .transport
                .global_reduce(state.alive().len() as u64, ReduceOp::Sum)?;
            if alive == 0 {
                return Ok(state);
            }
            level += 1;
        }
    }
}

fn reduce_u32<T: Transport>(transport: &mut T, value: u32, op: ReduceOp) -> Result<u32, TrussError> {
    let reduced = transport.global_reduce(u64::from(value), op)?;
    u32::try_from(reduced).map_err(|_| {
        sync_error("reduce-overflow", "reduced value exceeds u32")
            .with_context("value", reduced)
    })
}

/// Sends one message to every peer and collects exactly one from each.
fn exchange<T: Transport>(
    transport: &mut T,
    superstep: u64,
    outbound: Vec<(WorkerId, SyncMessage)>,
) -> Result<Vec<SyncMessage>, TrussError> {
    let rank = transport.rank();
    for (peer, message) in outbound {
        transport.send(peer, message.encode()?)?;
    }
    let mut inbound = Vec::new();
    for (peer, bytes) in transport.receive_all()? {
        let message = SyncMessage::decode(&bytes)
            .map_err(|err| err.with_context("worker", rank).with_context("peer", peer))?;
        if message.superstep != superstep {
            return Err(sync_error("superstep-mismatch", "peer is in another superstep")
                .with_context("worker", rank)
                .with_context("peer", peer)
                .with_context("expected", superstep)
                .with_context("found", message.superstep));
        }
        if message.from != peer {
            return Err(sync_error("sender-mismatch", "message names another sender")
                .with_context("worker", rank)
                .with_context("peer", peer)
                .with_context("claimed", message.from));
        }
        inbound.push(message);
    }
    if inbound.len() + 1 != transport.size() {
        return Err(sync_error("missing-message", "not every peer reported")
            .with_context("worker", rank)
            .with_context("received", inbound.len()));
    }
    Ok(inbound)
}

fn sync_error(code: impl Into<String>, message: impl Into<String>) -> TrussError {
    TrussError::Sync(ErrorInfo::new(code, message))
}
