//! Structured error types for the GHS simulation.
//!
//! All fallible public APIs return `Result<T, GhsError>`. The variants
//! fall into three groups with different handling:
//!
//! - **input errors** describe a bad graph description and are detected
//!   before any message is sent;
//! - **protocol violations** mean the node state machine reached a state
//!   it can never legally reach; the run is aborted on the spot;
//! - **convergence errors** mean the run reached quiescence (or its sweep
//!   bound) without a halted fragment core.

use crate::edge::{EdgeId, EdgeState, Weight};
use crate::node::NodeId;

/// The top-level error type for the GHS simulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GhsError {
    // ── Input errors ──────────────────────────────────────

    /// The textual graph description could not be parsed.
    #[error("malformed graph description: {reason}")]
    MalformedInput { reason: String },

    /// A vertex id lies outside `1..=vertex_count`.
    #[error("vertex {vertex} is out of range (graph has {vertex_count} vertices)")]
    VertexOutOfRange { vertex: u64, vertex_count: usize },

    /// An edge connects a vertex to itself.
    #[error("self loop on vertex {0}")]
    SelfLoop(NodeId),

    /// Two edges connect the same pair of vertices.
    #[error("duplicate edge between {a} and {b}")]
    DuplicateEdge { a: NodeId, b: NodeId },

    /// Two edges share a weight; the protocol needs distinct weights.
    #[error("edge weight {0} is used more than once")]
    DuplicateWeight(Weight),

    /// The weight collides with the internal "no candidate" sentinel.
    #[error("edge weight {0} is reserved")]
    ReservedWeight(Weight),

    // ── Node errors ───────────────────────────────────────

    /// A node id was referenced but is not part of the simulation.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// `wake` was requested on a node that already joined the protocol.
    #[error("node {0} is already awake")]
    AlreadyAwake(NodeId),

    // ── Protocol violations ───────────────────────────────

    /// A handler ran with a false precondition or referenced an unknown edge.
    #[error("protocol violation at {node}: {reason}")]
    ProtocolViolation { node: NodeId, reason: String },

    /// An edge classification tried to move backwards or sideways.
    #[error("protocol violation at {node}: edge {edge} cannot go from {from} to {to}")]
    IllegalEdgeTransition {
        node: NodeId,
        edge: EdgeId,
        from: EdgeState,
        to: EdgeState,
    },

    // ── Convergence errors ────────────────────────────────

    /// The run went quiet without a halted fragment core spanning the graph.
    #[error(
        "run did not halt: {sleeping} node(s) never woke, {pending} message(s) still queued, {halted} node(s) halted"
    )]
    DidNotHalt {
        sleeping: usize,
        pending: usize,
        halted: usize,
    },

    /// The driver's sweep bound was exhausted before quiescence.
    #[error("no progress: sweep limit of {limit} exceeded")]
    SweepLimitExceeded { limit: u64 },
}

impl GhsError {
    /// Shorthand for a [`GhsError::ProtocolViolation`] raised by `node`.
    pub fn violation(node: NodeId, reason: impl Into<String>) -> Self {
        GhsError::ProtocolViolation {
            node,
            reason: reason.into(),
        }
    }

    /// Whether this error was caused by the graph description rather than
    /// by the run itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            GhsError::MalformedInput { .. }
                | GhsError::VertexOutOfRange { .. }
                | GhsError::SelfLoop(_)
                | GhsError::DuplicateEdge { .. }
                | GhsError::DuplicateWeight(_)
                | GhsError::ReservedWeight(_)
        )
    }

    /// Whether the run ended without converging (as opposed to aborting).
    pub fn is_non_convergence(&self) -> bool {
        matches!(
            self,
            GhsError::DidNotHalt { .. } | GhsError::SweepLimitExceeded { .. }
        )
    }
}

/// Convenience alias for `Result<T, GhsError>`.
pub type GhsResult<T> = Result<T, GhsError>;
