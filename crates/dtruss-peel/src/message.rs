use dtruss_core::errors::{ErrorInfo, TrussError};
use dtruss_core::{DirectedEdge, Supports, WorkerId};
use serde::{Deserialize, Serialize};

/// Payload exchanged between two workers at a barrier.
///
/// Superstep `0` carries owned supports for replica reconciliation; later
/// supersteps carry the owned edges the sender peeled. A message is sent to
/// every peer at every barrier, even when both lists are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// Superstep the message belongs to.
    pub superstep: u64,
    /// Sending worker.
    pub from: WorkerId,
    /// Edges removed by the sender during this superstep.
    pub peeled: Vec<DirectedEdge>,
    /// Authoritative supports of edges owned by the sender.
    pub supports: Vec<(DirectedEdge, Supports)>,
}

impl SyncMessage {
    /// Peel notification.
    pub fn peeled(superstep: u64, from: WorkerId, peeled: Vec<DirectedEdge>) -> Self {
        Self {
            superstep,
            from,
            peeled,
            supports: Vec::new(),
        }
    }

    /// Support snapshot for reconciliation.
    pub fn supports(superstep: u64, from: WorkerId, supports: Vec<(DirectedEdge, Supports)>) -> Self {
        Self {
            superstep,
            from,
            peeled: Vec::new(),
            supports,
        }
    }

    /// Encodes the message with `bincode`.
    pub fn encode(&self) -> Result<Vec<u8>, TrussError> {
        bincode::serialize(self).map_err(|err| {
            TrussError::Serde(ErrorInfo::new("encode-message", err.to_string()))
        })
    }

    /// Decodes a message; undecodable payloads are synchronization failures.
    pub fn decode(bytes: &[u8]) -> Result<Self, TrussError> {
        bincode::deserialize(bytes).map_err(|err| {
            TrussError::Sync(
                ErrorInfo::new("malformed-message", "peer payload could not be decoded")
                    .with_context("reason", err)
                    .with_context("bytes", bytes.len()),
            )
        })
    }
}
