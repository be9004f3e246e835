#![deny(missing_docs)]

//! Edge partitioners for distributed truss decomposition.
//!
//! A [`Partition`] maps every edge of a [`dtruss_graph::DirectedGraph`] to
//! exactly one worker. Two strategies produce it:
//!
//! * [`type_aware_partition`] balances triangle load of one kind while keeping
//!   triangles of that kind inside a fragment where possible;
//! * [`stratified_partition`] cuts the edge set into trussness strata of
//!   bounded flow weight, given per-edge trussness pairs from a prior pass.
//!
//! [`Partition::fragment_for`] turns an assignment into the per-worker view
//! the peeling engine runs on.

mod assignment;
mod strategy;
mod stratified;
mod type_aware;

pub use assignment::{Fragment, Partition};
pub use strategy::PartitionStrategy;
pub use stratified::stratified_partition;
pub use type_aware::{type_aware_partition, TypeAwareOptions};
