//! # GHS — Distributed Minimum Spanning Tree Simulation
//!
//! A deterministic, single-threaded simulation of the Gallager-Humblet-Spira
//! protocol. Every vertex is an independent state machine that only reads
//! its own queue and only writes messages addressed to neighbours; a sweep
//! scheduler stands in for network asynchrony.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │        Simulation          │ ← wake, run to quiescence, verdict
//! │  ┌──────────────────────┐ │
//! │  │     Scheduler         │ │ ← ascending-id sweeps
//! │  └──────────────────────┘ │
//! │  ┌──────────────────────┐ │
//! │  │     NodeRuntime       │ │ ← nodes + message bus
//! │  │  ┌────────────────┐  │ │
//! │  │  │    GhsNode      │  │ │ ← per-vertex protocol state
//! │  │  └────────────────┘  │ │
//! │  └──────────────────────┘ │
//! └───────────────────────────┘
//! ```
//!
//! ```
//! use ghs::{minimum_spanning_tree, Graph, SimulationConfig};
//!
//! let graph: Graph = "3 3  1 2 1  2 3 2  1 3 3".parse()?;
//! let report = minimum_spanning_tree(&graph, SimulationConfig::default())?;
//! assert_eq!(report.tree.total_weight(), 3);
//! # Ok::<(), ghs::GhsError>(())
//! ```

pub mod config;
pub mod edge;
pub mod error;
pub mod generate;
pub mod graph;
pub mod node;
pub mod scheduler;
pub mod simulation;

// Re-exports for convenience.
pub use config::SimulationConfig;
pub use edge::{Edge, EdgeId, EdgeState, Weight};
pub use error::{GhsError, GhsResult};
pub use generate::{random_connected, DeterministicRng};
pub use graph::{Graph, GraphEdge, SpanningTree, MAX_VERTICES};
pub use node::{
    ActivityState, Envelope, FragmentId, GhsNode, Level, Message, NodeId, NodeRuntime, TraceEntry,
    TraceEvent,
};
pub use scheduler::{RunStats, Scheduler, SweepReport};
pub use simulation::{minimum_spanning_tree, RunReport, Simulation, SimulationContext};
