/// Simulation driver.
///
/// Builds the network, wakes the start node, runs sweeps until the
/// network goes quiet and turns the final edge classification into a
/// spanning tree. The loop is purely synchronous and single-threaded, so
/// two runs over the same graph and configuration are identical.

use crate::config::SimulationConfig;
use crate::edge::Weight;
use crate::error::{GhsError, GhsResult};
use crate::graph::{Graph, SpanningTree};
use crate::node::{Envelope, GhsNode, NodeId, NodeRuntime, TraceEntry, TraceEvent};
use crate::scheduler::{RunStats, Scheduler, SweepReport};

// ── Simulation Context ───────────────────────────────────────────────

/// Mutable context passed to a node for the duration of one turn.
///
/// It is the node's only window on the rest of the network: messages
/// leave through [`send`](Self::send) and observable steps are written
/// through [`record`](Self::record). Sent messages are collected and
/// delivered by the scheduler once the sweep ends.
pub struct SimulationContext<'a> {
    pub(crate) outbox: &'a mut Vec<Envelope>,
    pub(crate) trace: Option<&'a mut Vec<TraceEntry>>,
    pub(crate) sweep: u64,
}

impl<'a> SimulationContext<'a> {
    pub fn new(
        outbox: &'a mut Vec<Envelope>,
        trace: Option<&'a mut Vec<TraceEntry>>,
        sweep: u64,
    ) -> Self {
        SimulationContext {
            outbox,
            trace,
            sweep,
        }
    }

    /// Hand a message to the bus.
    pub fn send(&mut self, envelope: Envelope) {
        tracing::debug!(
            from = %envelope.from,
            to = %envelope.to,
            message = %envelope.message,
            "send"
        );
        self.record(
            envelope.from,
            TraceEvent::Sent {
                to: envelope.to,
                message: envelope.message,
            },
        );
        self.outbox.push(envelope);
    }

    /// Append a step to the trace, if recording.
    pub fn record(&mut self, node: NodeId, event: TraceEvent) {
        if let Some(trace) = self.trace.as_deref_mut() {
            trace.push(TraceEntry {
                sweep: self.sweep,
                node,
                event,
            });
        }
    }
}

// ── Run report ────────────────────────────────────────────────────────

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    /// The minimum spanning tree, one entry per undirected edge.
    pub tree: SpanningTree,
    /// Fragment cores that detected termination.
    pub halted: Vec<NodeId>,
    pub stats: RunStats,
}

// ── Simulation ────────────────────────────────────────────────────────

/// Top-level simulation driver.
///
/// Owns every node (through [`NodeRuntime`]) and the sweep scheduler.
/// Call [`run`](Self::run) to execute to completion, or
/// [`step`](Self::step) to advance by exactly one sweep.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    runtime: NodeRuntime,
    scheduler: Scheduler,
    started: bool,
}

impl Simulation {
    /// A network of sleeping nodes `V1..=Vn` without edges.
    pub fn new(node_count: usize) -> Self {
        Simulation::with_config(node_count, SimulationConfig::default())
    }

    pub fn with_config(node_count: usize, config: SimulationConfig) -> Self {
        let mut runtime = NodeRuntime::with_nodes(node_count);
        if config.record_trace {
            runtime.enable_trace();
        }
        Simulation {
            config,
            runtime,
            scheduler: Scheduler::new(),
            started: false,
        }
    }

    /// One node per vertex and two local edge records per graph edge.
    pub fn from_graph(graph: &Graph, config: SimulationConfig) -> GhsResult<Self> {
        let mut sim = Simulation::with_config(graph.vertex_count(), config);
        for edge in graph.edges() {
            sim.add_edge(edge.a, edge.b, edge.weight)?;
        }
        Ok(sim)
    }

    /// Connect two nodes. Only allowed before the run starts.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: Weight) -> GhsResult<()> {
        if self.started {
            return Err(GhsError::violation(a, "topology changed after the run started"));
        }
        self.runtime.add_edge(a, b, weight)
    }

    /// Wake a node from outside the protocol.
    pub fn wake(&mut self, id: NodeId) -> GhsResult<()> {
        self.scheduler.wake(&mut self.runtime, id)?;
        self.started = true;
        Ok(())
    }

    /// Run exactly one sweep.
    pub fn step(&mut self) -> GhsResult<SweepReport> {
        self.scheduler.sweep(&mut self.runtime)
    }

    /// Run to completion.
    ///
    /// Wakes the configured start node unless a node was woken already,
    /// then sweeps until quiescence. Succeeds only if exactly one fragment
    /// core halted, every node joined, no message is left queued and the
    /// `Branch` edges span the whole network.
    pub fn run(&mut self) -> GhsResult<RunReport> {
        if !self.started {
            self.wake(self.config.start)?;
        }

        let limit = self.sweep_limit();
        loop {
            if self.scheduler.sweeps() >= limit {
                tracing::warn!(limit, "sweep limit exceeded");
                return Err(GhsError::SweepLimitExceeded { limit });
            }
            if self.step()?.is_quiescent() {
                break;
            }
        }

        let node_count = self.runtime.node_count();
        let halted = self.runtime.halted_nodes();
        let sleeping = self.runtime.sleeping_count();
        let pending = self.runtime.pending_messages();
        // One core per run: both endpoints of the final core edge, or the
        // lone vertex of a one-vertex graph.
        let expected_halted = node_count.min(2);
        let tree = if halted.len() == expected_halted && sleeping == 0 && pending == 0 {
            Some(self.runtime.spanning_tree()?)
        } else {
            None
        };
        let Some(tree) = tree.filter(|t| t.len() + 1 == node_count) else {
            tracing::warn!(
                halted = halted.len(),
                sleeping,
                pending,
                "quiescent without convergence"
            );
            return Err(GhsError::DidNotHalt {
                sleeping,
                pending,
                halted: halted.len(),
            });
        };
        let stats = self.scheduler.stats();
        tracing::info!(
            edges = tree.len(),
            total_weight = %tree.total_weight(),
            sweeps = stats.sweeps,
            sent = stats.sent,
            "spanning tree complete"
        );
        Ok(RunReport {
            tree,
            halted,
            stats,
        })
    }

    /// Effective sweep bound for this network.
    pub fn sweep_limit(&self) -> u64 {
        self.config.sweep_limit(self.runtime.node_count())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn runtime(&self) -> &NodeRuntime {
        &self.runtime
    }

    pub fn node(&self, id: NodeId) -> Option<&GhsNode> {
        self.runtime.node(id)
    }

    pub fn stats(&self) -> RunStats {
        self.scheduler.stats()
    }

    /// The recorded trace (empty unless `record_trace` is set).
    pub fn trace(&self) -> &[TraceEntry] {
        self.runtime.trace()
    }
}

/// Build a simulation for `graph` and run it to completion.
pub fn minimum_spanning_tree(graph: &Graph, config: SimulationConfig) -> GhsResult<RunReport> {
    Simulation::from_graph(graph, config)?.run()
}
