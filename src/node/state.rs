//! Per-node protocol state: activity state, level and fragment identity.

use crate::edge::Weight;

/// A fragment's merge-round counter. Starts at 0 and only increases.
pub type Level = u32;

/// Identity of a fragment: the weight of its core edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentId(Weight);

impl FragmentId {
    /// The fragment whose core is the edge of weight `core`.
    #[inline]
    pub fn new(core: Weight) -> Self {
        FragmentId(core)
    }

    /// Weight of the core edge.
    #[inline]
    pub fn core_weight(self) -> Weight {
        self.0
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{}", self.0)
    }
}

/// What a node is currently doing.
///
/// ```text
/// Sleeping ──wake──▶ Found ──Initiate(Find)──▶ Find ──report──▶ Found ─ … ─▶ Halted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivityState {
    /// Has not joined the protocol yet.
    Sleeping,
    /// Searching for the fragment's minimum-weight outgoing edge.
    Find,
    /// Search finished (or not started); waiting.
    Found,
    /// Terminal: this node is a core of a fragment with no outgoing edge.
    Halted,
}

impl std::fmt::Display for ActivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityState::Sleeping => "Sleeping",
            ActivityState::Find => "Find",
            ActivityState::Found => "Found",
            ActivityState::Halted => "Halted",
        };
        f.write_str(s)
    }
}
