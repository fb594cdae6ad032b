//! Protocol messages and the envelope that routes them between nodes.

use crate::edge::Weight;

use super::id::NodeId;
use super::state::{ActivityState, FragmentId, Level};

// ── Message ───────────────────────────────────────────────────────────

/// The seven GHS message kinds, one payload shape per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    /// Ask the neighbor's fragment to join along this edge.
    Connect { level: Level },
    /// Broadcast a (new) fragment identity down the tree.
    Initiate {
        level: Level,
        fragment: FragmentId,
        state: ActivityState,
    },
    /// Probe whether the neighbor belongs to another fragment.
    Test { level: Level, fragment: FragmentId },
    /// Reply to `Test`: different fragment.
    Accept,
    /// Reply to `Test`: same fragment.
    Reject,
    /// Best outgoing weight found in the sender's subtree.
    Report { best: Weight },
    /// Move the fragment root toward the owner of the best edge.
    ChangeRoot,
}

impl Message {
    /// Short upper-case name, as used in traces.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Connect { .. } => "CONNECT",
            Message::Initiate { .. } => "INITIATE",
            Message::Test { .. } => "TEST",
            Message::Accept => "ACCEPT",
            Message::Reject => "REJECT",
            Message::Report { .. } => "REPORT",
            Message::ChangeRoot => "CHANGEROOT",
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Connect { level } => write!(f, "Connect(L={})", level),
            Message::Initiate {
                level,
                fragment,
                state,
            } => write!(f, "Initiate(L={}, {}, S={})", level, fragment, state),
            Message::Test { level, fragment } => write!(f, "Test(L={}, {})", level, fragment),
            Message::Accept => write!(f, "Accept"),
            Message::Reject => write!(f, "Reject"),
            Message::Report { best } => write!(f, "Report(w={})", best),
            Message::ChangeRoot => write!(f, "ChangeRoot"),
        }
    }
}

// ── Envelope ──────────────────────────────────────────────────────────

/// A message in flight, addressed from one vertex to a neighbor.
///
/// The receiver resolves `from` to its local edge record; there is at
/// most one edge per vertex pair, so the sender identifies the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    pub from: NodeId,
    pub to: NodeId,
    pub message: Message,
}

impl Envelope {
    pub fn new(from: NodeId, to: NodeId, message: Message) -> Self {
        Envelope { from, to, message }
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.message)
    }
}
