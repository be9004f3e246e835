use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for a vertex of the directed graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(u64);

impl VertexId {
    /// Creates a new identifier from its raw integer representation.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directed edge `(source, target)`, unique within a graph.
///
/// Ordering is lexicographic on `(source, target)`; every deterministic
/// tie-break in the pipeline relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DirectedEdge {
    /// Tail vertex.
    pub source: VertexId,
    /// Head vertex.
    pub target: VertexId,
}

impl DirectedEdge {
    /// Creates an edge between two vertices.
    pub const fn new(source: VertexId, target: VertexId) -> Self {
        Self { source, target }
    }

    /// Creates an edge from raw vertex identifiers.
    pub const fn from_raw(source: u64, target: u64) -> Self {
        Self::new(VertexId::from_raw(source), VertexId::from_raw(target))
    }

    /// Returns the edge with the opposite orientation.
    pub const fn reversed(&self) -> Self {
        Self::new(self.target, self.source)
    }

    /// Returns true when both endpoints coincide.
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }

    /// Returns the unordered vertex pair `(min, max)` spanned by the edge.
    pub fn pair(&self) -> (VertexId, VertexId) {
        if self.source <= self.target {
            (self.source, self.target)
        } else {
            (self.target, self.source)
        }
    }

    /// Returns true when `vertex` is one of the endpoints.
    pub fn touches(&self, vertex: VertexId) -> bool {
        self.source == vertex || self.target == vertex
    }
}

impl fmt::Display for DirectedEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.source, self.target)
    }
}

/// Index of a worker within the fleet, `0..size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(u32);

impl WorkerId {
    /// Creates a worker identifier from its index.
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the index of the worker.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Terminal `(k_c, k_f)` thresholds an edge survived during decomposition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TrussnessPair {
    /// Cycle-trussness.
    pub k_c: u32,
    /// Flow-trussness.
    pub k_f: u32,
}

impl TrussnessPair {
    /// Creates a trussness pair.
    pub const fn new(k_c: u32, k_f: u32) -> Self {
        Self { k_c, k_f }
    }

    /// Component-wise maximum of two pairs.
    pub fn max_components(self, other: Self) -> Self {
        Self::new(self.k_c.max(other.k_c), self.k_f.max(other.k_f))
    }
}

impl fmt::Display for TrussnessPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(k_c={}, k_f={})", self.k_c, self.k_f)
    }
}

/// Cycle and flow support counters of a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Supports {
    /// Number of directed 3-cycles containing the edge.
    pub cycle: u32,
    /// Number of transitive (flow) triangles containing the edge.
    pub flow: u32,
}

impl Supports {
    /// Creates a support record.
    pub const fn new(cycle: u32, flow: u32) -> Self {
        Self { cycle, flow }
    }

    /// Returns true when the edge satisfies both thresholds.
    pub fn meets(&self, thresholds: TrussnessPair) -> bool {
        self.cycle >= thresholds.k_c && self.flow >= thresholds.k_f
    }
}
