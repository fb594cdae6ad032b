//! Run configuration.

use crate::node::NodeId;

/// Sweeps allowed per run when no explicit bound is configured:
/// `BASE_SWEEP_LIMIT + SWEEPS_PER_NODE_PAIR · n²`.
pub const BASE_SWEEP_LIMIT: u64 = 1_000;
pub const SWEEPS_PER_NODE_PAIR: u64 = 100;

/// How a [`Simulation`](crate::Simulation) is driven.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// The node woken by the driver.
    pub start: NodeId,
    /// Upper bound on sweeps; `None` derives one from the node count.
    pub max_sweeps: Option<u64>,
    /// Record a [`TraceEntry`](crate::node::TraceEntry) for every node step.
    pub record_trace: bool,
}

impl SimulationConfig {
    pub fn with_start(mut self, start: NodeId) -> Self {
        self.start = start;
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: u64) -> Self {
        self.max_sweeps = Some(max_sweeps);
        self
    }

    pub fn with_trace(mut self, record: bool) -> Self {
        self.record_trace = record;
        self
    }

    /// Effective sweep bound for a network of `node_count` nodes.
    pub fn sweep_limit(&self, node_count: usize) -> u64 {
        self.max_sweeps.unwrap_or_else(|| {
            let n = node_count as u64;
            BASE_SWEEP_LIMIT.saturating_add(SWEEPS_PER_NODE_PAIR.saturating_mul(n.saturating_mul(n)))
        })
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            start: NodeId::new(1),
            max_sweeps: None,
            record_trace: false,
        }
    }
}
