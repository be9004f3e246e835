use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{ReduceOp, Transport, WorkerId};
use tracing::trace;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// In-process [`Transport`] connecting a fleet of worker threads.
///
/// Data payloads and reduction values travel on separate channels. A value
/// that arrives ahead of its round (a fast peer already in the next barrier)
/// is parked per sender until it is due.
#[derive(Debug)]
pub struct ChannelTransport {
    rank: WorkerId,
    size: usize,
    timeout: Duration,
    data_out: BTreeMap<WorkerId, Sender<(WorkerId, Vec<u8>)>>,
    data_in: Receiver<(WorkerId, Vec<u8>)>,
    reduce_out: BTreeMap<WorkerId, Sender<(WorkerId, u64)>>,
    reduce_in: Receiver<(WorkerId, u64)>,
    parked_data: Vec<VecDeque<Vec<u8>>>,
    parked_reduce: Vec<VecDeque<u64>>,
}

impl ChannelTransport {
    /// Connects `size` workers with the default barrier timeout.
    pub fn mesh(size: usize) -> Vec<Self> {
        Self::mesh_with_timeout(size, DEFAULT_TIMEOUT)
    }

    /// Connects `size` workers; a barrier waiting longer than `timeout` fails.
    pub fn mesh_with_timeout(size: usize, timeout: Duration) -> Vec<Self> {
        let (data_tx, data_rx): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();
        let (reduce_tx, reduce_rx): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();
        data_rx
            .into_iter()
            .zip(reduce_rx)
            .enumerate()
            .map(|(index, (data_in, reduce_in))| {
                let rank = WorkerId::new(index);
                let peers = || (0..size).filter(move |peer| *peer != index);
                Self {
                    rank,
                    size,
                    timeout,
                    data_out: peers()
                        .map(|peer| (WorkerId::new(peer), data_tx[peer].clone()))
                        .collect(),
                    data_in,
                    reduce_out: peers()
                        .map(|peer| (WorkerId::new(peer), reduce_tx[peer].clone()))
                        .collect(),
                    reduce_in,
                    parked_data: vec![VecDeque::new(); size],
                    parked_reduce: vec![VecDeque::new(); size],
                }
            })
            .collect()
    }
}

impl Transport for ChannelTransport {
    fn rank(&self) -> WorkerId {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&mut self, peer: WorkerId, payload: Vec<u8>) -> Result<(), TrussError> {
        let channel = self.data_out.get(&peer).ok_or_else(|| {
            sync_error("unknown-peer", "no channel to the requested worker")
                .with_context("from", self.rank)
                .with_context("peer", peer)
        })?;
        trace!(from = %self.rank, to = %peer, bytes = payload.len(), "send");
        channel.send((self.rank, payload)).map_err(|_| {
            sync_error("peer-disconnected", "peer hung up before the barrier")
                .with_context("from", self.rank)
                .with_context("peer", peer)
        })
    }

    fn receive_all(&mut self) -> Result<Vec<(WorkerId, Vec<u8>)>, TrussError> {
        gather(
            self.rank,
            self.timeout,
            &self.data_in,
            &mut self.parked_data,
            "data",
        )
    }

    fn global_reduce(&mut self, value: u64, op: ReduceOp) -> Result<u64, TrussError> {
        for (peer, channel) in &self.reduce_out {
            channel.send((self.rank, value)).map_err(|_| {
                sync_error("peer-disconnected", "peer hung up before the reduction")
                    .with_context("from", self.rank)
                    .with_context("peer", peer)
            })?;
        }
        let mut contributions = gather(
            self.rank,
            self.timeout,
            &self.reduce_in,
            &mut self.parked_reduce,
            "reduce",
        )?;
        contributions.push((self.rank, value));
        contributions.sort_by_key(|(rank, _)| *rank);
        contributions
            .into_iter()
            .try_fold(op.identity(), |acc, (_, value)| op.fold(acc, value))
            .ok_or_else(|| {
                sync_error("reduce-overflow", "global sum overflowed")
                    .with_context("worker", self.rank)
            })
    }
}

/// Blocks until every peer has one parked value, then pops one per peer in rank order.
fn gather<T>(
    rank: WorkerId,
    timeout: Duration,
    inbox: &Receiver<(WorkerId, T)>,
    parked: &mut [VecDeque<T>],
    channel: &str,
) -> Result<Vec<(WorkerId, T)>, TrussError> {
    let deadline = Instant::now() + timeout;
    let missing = |parked: &[VecDeque<T>]| -> Vec<usize> {
        (0..parked.len())
            .filter(|peer| *peer != rank.index() && parked[*peer].is_empty())
            .collect()
    };
    loop {
        let waiting = missing(parked);
        if waiting.is_empty() {
            break;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        match inbox.recv_timeout(remaining) {
            Ok((from, value)) => {
                if from.index() >= parked.len() || from == rank {
                    return Err(sync_error("unknown-sender", "payload from outside the fleet")
                        .with_context("worker", rank)
                        .with_context("sender", from));
                }
                parked[from.index()].push_back(value);
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(sync_error("peer-timeout", "peers missed the barrier")
                    .with_context("worker", rank)
                    .with_context("channel", channel)
                    .with_context("missing", format!("{waiting:?}"))
                    .with_hint("raise `sync_timeout_ms` or check the failing worker's log"));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(sync_error("peer-disconnected", "all peers hung up")
                    .with_context("worker", rank)
                    .with_context("channel", channel)
                    .with_context("missing", format!("{waiting:?}")));
            }
        }
    }
    let mut collected = Vec::with_capacity(parked.len().saturating_sub(1));
    for (peer, queue) in parked.iter_mut().enumerate() {
        if peer == rank.index() {
            continue;
        }
        if let Some(value) = queue.pop_front() {
            collected.push((WorkerId::new(peer), value));
        }
    }
    Ok(collected)
}

fn sync_error(code: impl Into<String>, message: impl Into<String>) -> TrussError {
    TrussError::Sync(ErrorInfo::new(code, message))
}
