//! Edge model: weights, local edge ids and per-endpoint classification.
//!
//! Each undirected edge of the graph is stored twice, once in the local
//! edge list of each endpoint. The two copies share a weight but are
//! classified independently by their owners.

use crate::node::NodeId;

// ── Weight ────────────────────────────────────────────────────────────

/// An edge weight.
///
/// Weights are assumed pairwise distinct across the whole graph, which
/// makes every "minimum edge" selection unique. The largest representable
/// value is reserved as [`Weight::INFINITY`], the "no candidate" sentinel
/// carried by `Report` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Weight(i64);

impl Weight {
    /// Sentinel meaning "no outgoing edge found".
    pub const INFINITY: Weight = Weight(i64::MAX);

    #[inline]
    pub fn new(w: i64) -> Self {
        Weight(w)
    }

    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        self == Weight::INFINITY
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_infinite() {
            write!(f, "∞")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ── EdgeId ────────────────────────────────────────────────────────────

/// Index of an edge inside its owning node's edge list.
///
/// Only meaningful together with the owning node; the two endpoint copies
/// of one undirected edge usually carry different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(usize);

impl EdgeId {
    #[inline]
    pub fn new(index: usize) -> Self {
        EdgeId(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ── EdgeState ─────────────────────────────────────────────────────────

/// Classification of an edge from one endpoint's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeState {
    /// Not yet decided.
    Basic,
    /// Part of the spanning tree.
    Branch,
    /// Known to connect two nodes of the same fragment.
    Rejected,
}

impl std::fmt::Display for EdgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EdgeState::Basic => "Basic",
            EdgeState::Branch => "Branch",
            EdgeState::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// A classification change that would break monotonicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("edge cannot go from {from} to {to}")]
pub struct TransitionError {
    pub from: EdgeState,
    pub to: EdgeState,
}

// ── Edge ──────────────────────────────────────────────────────────────

/// One endpoint's record of an incident edge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    id: EdgeId,
    remote: NodeId,
    weight: Weight,
    state: EdgeState,
}

impl Edge {
    /// A fresh, undecided edge.
    pub fn new(id: EdgeId, remote: NodeId, weight: Weight) -> Self {
        Edge {
            id,
            remote,
            weight,
            state: EdgeState::Basic,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// The vertex at the other end.
    pub fn remote(&self) -> NodeId {
        self.remote
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn state(&self) -> EdgeState {
        self.state
    }

    pub fn is_basic(&self) -> bool {
        self.state == EdgeState::Basic
    }

    pub fn is_branch(&self) -> bool {
        self.state == EdgeState::Branch
    }

    /// Move the edge to `next`.
    ///
    /// `Basic` may move to `Branch` or `Rejected`; re-applying the current
    /// state is a no-op. Returns `Ok(true)` when the state actually changed.
    pub fn classify(&mut self, next: EdgeState) -> Result<bool, TransitionError> {
        match (self.state, next) {
            (from, to) if from == to => Ok(false),
            (EdgeState::Basic, EdgeState::Branch | EdgeState::Rejected) => {
                self.state = next;
                Ok(true)
            }
            (from, to) => Err(TransitionError { from, to }),
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(->{}, w={}, {})",
            self.id, self.remote, self.weight, self.state
        )
    }
}
