//! `NodeRuntime` — owns all nodes and delivers messages into their queues.

use std::collections::{BTreeMap, BTreeSet};

use crate::edge::Weight;
use crate::error::{GhsError, GhsResult};
use crate::graph::{GraphEdge, SpanningTree};

use super::ghs::GhsNode;
use super::id::NodeId;
use super::payload::Envelope;
use super::trace::TraceEntry;

/// The set of simulated nodes plus the bus that connects them.
///
/// Nodes never see each other: the runtime is the only place holding
/// more than one node, and it only ever touches a node to append to its
/// queue or to give it a turn.
#[derive(Debug, Clone, Default)]
pub struct NodeRuntime {
    pub(crate) nodes: BTreeMap<NodeId, GhsNode>,
    weights: BTreeSet<Weight>,
    /// Append-only trace of node steps, present when recording is enabled.
    pub(crate) trace: Option<Vec<TraceEntry>>,
}

impl NodeRuntime {
    /// Create an empty runtime without trace recording.
    pub fn new() -> Self {
        NodeRuntime::default()
    }

    /// Create a runtime with nodes `V1..=Vn`.
    pub fn with_nodes(count: usize) -> Self {
        let mut rt = NodeRuntime::new();
        for raw in 1..=count as u64 {
            rt.register(NodeId::new(raw));
        }
        rt
    }

    /// Start recording a trace (no-op if already recording).
    pub fn enable_trace(&mut self) {
        self.trace.get_or_insert_with(Vec::new);
    }

    /// Register a sleeping node. Re-registering an id keeps the existing node.
    pub fn register(&mut self, id: NodeId) {
        self.nodes.entry(id).or_insert_with(|| GhsNode::new(id));
    }

    /// Connect `a` and `b` with an undirected edge of weight `weight`.
    ///
    /// Each endpoint receives its own local record of the edge.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: Weight) -> GhsResult<()> {
        if a == b {
            return Err(GhsError::SelfLoop(a));
        }
        if weight.is_infinite() {
            return Err(GhsError::ReservedWeight(weight));
        }
        let node_a = self.nodes.get(&a).ok_or(GhsError::NodeNotFound(a))?;
        if !self.nodes.contains_key(&b) {
            return Err(GhsError::NodeNotFound(b));
        }
        if node_a.edge_to(b).is_some() {
            return Err(GhsError::DuplicateEdge { a, b });
        }
        if !self.weights.insert(weight) {
            return Err(GhsError::DuplicateWeight(weight));
        }

        if let Some(node) = self.nodes.get_mut(&a) {
            node.add_edge(b, weight);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.add_edge(a, weight);
        }
        Ok(())
    }

    /// Append a message to the recipient's queue.
    pub fn deliver(&mut self, envelope: Envelope) -> GhsResult<()> {
        let node = self
            .nodes
            .get_mut(&envelope.to)
            .ok_or(GhsError::NodeNotFound(envelope.to))?;
        node.push_message(envelope);
        Ok(())
    }

    /// Deliver a batch of messages in order.
    pub fn deliver_all(&mut self, envelopes: impl IntoIterator<Item = Envelope>) -> GhsResult<()> {
        for envelope in envelopes {
            self.deliver(envelope)?;
        }
        Ok(())
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Immutable access to one node.
    pub fn node(&self, id: NodeId) -> Option<&GhsNode> {
        self.nodes.get(&id)
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &GhsNode> + '_ {
        self.nodes.values()
    }

    /// Messages waiting in any queue.
    pub fn pending_messages(&self) -> usize {
        self.nodes.values().map(GhsNode::queue_len).sum()
    }

    /// Nodes that never joined the protocol.
    pub fn sleeping_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_sleeping()).count()
    }

    /// Nodes in the terminal `Halted` state.
    pub fn halted_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.is_halted())
            .map(GhsNode::id)
            .collect()
    }

    /// The recorded trace (empty when recording is disabled).
    pub fn trace(&self) -> &[TraceEntry] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Collect the `Branch` edges of all nodes into one tree, reporting
    /// every undirected edge once.
    ///
    /// Both endpoints must agree on every branch; a one-sided branch is a
    /// protocol violation.
    pub fn spanning_tree(&self) -> GhsResult<SpanningTree> {
        let mut edges = Vec::new();
        for node in self.nodes.values() {
            for edge in node.branch_edges() {
                let remote = self
                    .nodes
                    .get(&edge.remote())
                    .ok_or(GhsError::NodeNotFound(edge.remote()))?;
                let mirrored = remote
                    .edge_to(node.id())
                    .is_some_and(|e| e.is_branch());
                if !mirrored {
                    return Err(GhsError::violation(
                        node.id(),
                        format!("branch {} is not a branch at {}", edge, edge.remote()),
                    ));
                }
                if node.id() < edge.remote() {
                    edges.push(GraphEdge::new(node.id(), edge.remote(), edge.weight()));
                }
            }
        }
        Ok(SpanningTree::from_edges(edges))
    }
}
