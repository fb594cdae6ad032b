/// Sweep scheduler: the cooperative stand-in for network asynchrony.
///
/// A sweep visits every node once in ascending id order and lets it
/// consume at most one queued message. Messages produced during a sweep
/// are delivered when the sweep ends, so a node never sees a reply in the
/// same sweep that caused it. Deferred messages stay queued and are
/// offered again in later sweeps, after other nodes had a chance to
/// advance their level or fragment.

use crate::error::{GhsError, GhsResult};
use crate::node::{NodeId, NodeRuntime};
use crate::simulation::SimulationContext;

/// Counters describing one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepReport {
    /// 1-based sweep number.
    pub sweep: u64,
    /// Handler invocations that consumed their message.
    pub processed: u64,
    /// Handler invocations that re-enqueued their message.
    pub deferred: u64,
    /// New messages produced during the sweep.
    pub sent: u64,
}

impl SweepReport {
    /// No handler made progress and nothing new is in flight.
    pub fn is_quiescent(&self) -> bool {
        self.processed == 0 && self.sent == 0
    }
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RunStats {
    pub sweeps: u64,
    /// Messages handed to the bus, including the driver's wake-up.
    pub sent: u64,
    /// Messages consumed by a successful handler invocation.
    pub consumed: u64,
    /// Deferral events (one message may be deferred many times).
    pub deferred: u64,
}

/// Drives sweeps over a [`NodeRuntime`] and keeps the run totals.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    stats: RunStats,
}

impl Scheduler {
    /// Create a scheduler that has not swept yet.
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// Totals so far.
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Sweeps performed so far.
    pub fn sweeps(&self) -> u64 {
        self.stats.sweeps
    }

    /// Wake `id` from outside the protocol and deliver what it sends.
    pub fn wake(&mut self, rt: &mut NodeRuntime, id: NodeId) -> GhsResult<()> {
        let mut outbox = Vec::new();
        {
            let NodeRuntime { nodes, trace, .. } = &mut *rt;
            let node = nodes
                .get_mut(&id)
                .ok_or(GhsError::NodeNotFound(id))?;
            let mut ctx = SimulationContext::new(&mut outbox, trace.as_mut(), self.stats.sweeps);
            node.wake(&mut ctx)?;
        }
        self.stats.sent += outbox.len() as u64;
        rt.deliver_all(outbox)
    }

    /// Run one sweep over every node.
    pub fn sweep(&mut self, rt: &mut NodeRuntime) -> GhsResult<SweepReport> {
        self.stats.sweeps += 1;
        let mut report = SweepReport {
            sweep: self.stats.sweeps,
            ..SweepReport::default()
        };
        let mut outbox = Vec::new();

        {
            let NodeRuntime { nodes, trace, .. } = &mut *rt;
            for node in nodes.values_mut() {
                let mut ctx = SimulationContext::new(&mut outbox, trace.as_mut(), report.sweep);
                let turn = node.take_turn(&mut ctx)?;
                if turn.processed {
                    report.processed += 1;
                }
                report.deferred += turn.deferred;
            }
        }

        report.sent = outbox.len() as u64;
        rt.deliver_all(outbox)?;

        self.stats.sent += report.sent;
        self.stats.consumed += report.processed;
        self.stats.deferred += report.deferred;

        tracing::debug!(
            sweep = report.sweep,
            processed = report.processed,
            deferred = report.deferred,
            sent = report.sent,
            "sweep finished"
        );
        Ok(report)
    }
}
