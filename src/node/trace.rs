//! TraceEntry — records every observable step a node takes.

use crate::edge::{EdgeId, EdgeState};

use super::id::NodeId;
use super::payload::Message;
use super::state::{ActivityState, FragmentId, Level};

/// Something a node did during its turn.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum TraceEvent {
    /// The node left `Sleeping` and joined the protocol.
    Woke,
    /// The activity state changed.
    StateChanged {
        from: ActivityState,
        to: ActivityState,
    },
    /// A new level was adopted.
    LevelChanged(Level),
    /// A new fragment identity was adopted.
    FragmentChanged(FragmentId),
    /// A message was handed to the bus.
    Sent { to: NodeId, message: Message },
    /// A queued message was fully handled.
    Processed { from: NodeId, message: Message },
    /// A queued message was not actionable yet and went back to the tail.
    Deferred { from: NodeId, message: Message },
    /// A local edge record changed classification.
    EdgeClassified {
        edge: EdgeId,
        remote: NodeId,
        from: EdgeState,
        to: EdgeState,
    },
    /// The node is a fragment core and no outgoing edge remains.
    Halted,
}

/// A single step recorded by the simulation.
///
/// `sweep` is the scheduler sweep during which the step happened;
/// sweep 0 is the driver's initial wake-up.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    pub sweep: u64,
    pub node: NodeId,
    pub event: TraceEvent,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[S={}] {} ", self.sweep, self.node)?;
        match &self.event {
            TraceEvent::Woke => write!(f, "woke up"),
            TraceEvent::StateChanged { from, to } => write!(f, "state {} -> {}", from, to),
            TraceEvent::LevelChanged(level) => write!(f, "level is now {}", level),
            TraceEvent::FragmentChanged(fragment) => write!(f, "fragment is now {}", fragment),
            TraceEvent::Sent { to, message } => write!(f, "sent {} to {}", message, to),
            TraceEvent::Processed { from, message } => {
                write!(f, "processed {} from {}", message, from)
            }
            TraceEvent::Deferred { from, message } => {
                write!(f, "deferred {} from {}", message, from)
            }
            TraceEvent::EdgeClassified {
                edge,
                remote,
                from,
                to,
            } => write!(f, "edge {} (->{}) {} -> {}", edge, remote, from, to),
            TraceEvent::Halted => write!(f, "HALT"),
        }
    }
}
