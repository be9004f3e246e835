#![deny(missing_docs)]

//! Core identifiers, error taxonomy and the transport contract shared by the
//! dtruss crates.

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod provenance;
pub mod rng;
mod types;

pub use errors::{ErrorInfo, TrussError};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
pub use types::{DirectedEdge, Supports, TrussnessPair, VertexId, WorkerId};

/// Associative operation applied by [`Transport::global_reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReduceOp {
    /// Logical OR over values interpreted as booleans (non-zero is true).
    Or,
    /// Maximum.
    Max,
    /// Wrapping-free sum; overflow is reported by the transport.
    Sum,
}

impl ReduceOp {
    /// Returns the neutral element of the operation.
    pub fn identity(&self) -> u64 {
        0
    }

    /// Folds `value` into `acc`. Returns `None` when a sum overflows.
    pub fn fold(&self, acc: u64, value: u64) -> Option<u64> {
        match self {
            ReduceOp::Or => Some(u64::from(acc != 0 || value != 0)),
            ReduceOp::Max => Some(acc.max(value)),
            ReduceOp::Sum => acc.checked_add(value),
        }
    }
}

/// Message-passing substrate consumed by the peeling engine.
///
/// Implementations move opaque byte buffers between a fixed set of workers.
/// The engine relies on three guarantees:
///
/// * [`Transport::send`] never loses a payload; it may return before delivery
///   but all payloads sent in a superstep are delivered before the peer's
///   matching [`Transport::receive_all`] returns.
/// * [`Transport::receive_all`] blocks until exactly one payload from every
///   other worker has arrived and returns them ordered by sender rank.
/// * [`Transport::global_reduce`] returns the same aggregate to every worker.
///
/// A payload that never arrives must surface as [`TrussError::Sync`]; the
/// engine treats it as fatal.
pub trait Transport: Send {
    /// Rank of the calling worker.
    fn rank(&self) -> WorkerId;

    /// Number of workers in the fleet.
    fn size(&self) -> usize;

    /// Sends a payload to `peer`.
    fn send(&mut self, peer: WorkerId, payload: Vec<u8>) -> Result<(), TrussError>;

    /// Blocks until one payload from each other worker has been received.
    fn receive_all(&mut self) -> Result<Vec<(WorkerId, Vec<u8>)>, TrussError>;

    /// Aggregates `value` across all workers.
    fn global_reduce(&mut self, value: u64, op: ReduceOp) -> Result<u64, TrussError>;
}
