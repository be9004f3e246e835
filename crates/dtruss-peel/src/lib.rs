#![deny(missing_docs)]

//! Bulk-synchronous distributed peeling of directed trusses.
//!
//! Every worker owns a fragment of the edge set and runs the same superstep
//! loop: peel owned edges below the current `(k_c, k_f)` thresholds, apply the
//! removals to its local view, exchange peel notifications with every peer,
//! and agree through a global reduction whether a fixed point was reached.
//! At a fixed point the surviving owned edges record the current level and
//! the [`Schedule`] decides whether to raise a threshold.
//!
//! [`ChannelTransport`] runs a whole fleet in one process; [`decompose`] is
//! the end-to-end entry point used by the CLI.

mod channel;
mod config;
mod driver;
mod engine;
mod flow;
mod message;
mod worker;

pub use channel::ChannelTransport;
pub use config::{EngineConfig, Pass, RunConfig, Schedule};
pub use driver::{
    build_partition, decompose, decompose_single, run_local, DecompositionReport, EdgeTrussness,
    WorkerSummary, REPORT_SCHEMA,
};
pub use engine::{run_worker, SuperstepStats, WorkerOutcome};
pub use flow::{flow_decomposition, FlowDecomposition};
pub use message::SyncMessage;
pub use worker::WorkerState;
