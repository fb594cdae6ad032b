//! Protocol nodes and the runtime that connects them.
//!
//! Nodes never share memory: a node reads only its own queue and edge
//! records, and everything it says to a neighbour goes through the
//! [`SimulationContext`](crate::SimulationContext) outbox.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`id`] | [`NodeId`] newtype |
//! | [`state`] | [`ActivityState`], [`FragmentId`], [`Level`] |
//! | [`payload`] | [`Message`], [`Envelope`] |
//! | [`ghs`] | [`GhsNode`] state machine |
//! | [`trace`] | [`TraceEntry`], [`TraceEvent`] |
//! | [`runtime`] | [`NodeRuntime`] struct |

pub mod ghs;
pub mod id;
pub mod payload;
pub mod runtime;
pub mod state;
pub mod trace;

// Flat re-exports so external callers can use `ghs::node::NodeId` etc.
pub use ghs::{Disposition, GhsNode, TurnOutcome};
pub use id::NodeId;
pub use payload::{Envelope, Message};
pub use runtime::NodeRuntime;
pub use state::{ActivityState, FragmentId, Level};
pub use trace::{TraceEntry, TraceEvent};

#[cfg(test)]
mod tests;
