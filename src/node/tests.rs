//! Handler-level tests for `GhsNode`.
//!
//! Each test drives a single node by hand through a local outbox, so the
//! assertions see exactly what the node sent and nothing else.

use crate::edge::{EdgeState, Weight};
use crate::error::GhsError;
use crate::node::{
    ActivityState, Disposition, Envelope, FragmentId, GhsNode, Message, NodeId, TraceEvent,
};
use crate::simulation::SimulationContext;

fn v(raw: u64) -> NodeId {
    NodeId::new(raw)
}

fn w(raw: i64) -> Weight {
    Weight::new(raw)
}

/// V1 with edges to V2 (w=1), V3 (w=5) and V4 (w=7).
fn star() -> GhsNode {
    let mut node = GhsNode::new(v(1));
    node.add_edge(v(2), w(1));
    node.add_edge(v(3), w(5));
    node.add_edge(v(4), w(7));
    node
}

fn deliver(
    node: &mut GhsNode,
    outbox: &mut Vec<Envelope>,
    from: NodeId,
    message: Message,
) -> Result<Disposition, GhsError> {
    let mut ctx = SimulationContext::new(outbox, None, 1);
    let envelope = Envelope::new(from, node.id(), message);
    node.handle(&mut ctx, &envelope)
}

fn wake(node: &mut GhsNode, outbox: &mut Vec<Envelope>) {
    let mut ctx = SimulationContext::new(outbox, None, 0);
    node.wake(&mut ctx).unwrap();
}

/// Wake the star and let V2 start a level-1 search in fragment F1.
fn searching_star(outbox: &mut Vec<Envelope>) -> GhsNode {
    let mut node = star();
    wake(&mut node, outbox);
    let initiate = Message::Initiate {
        level: 1,
        fragment: FragmentId::new(w(1)),
        state: ActivityState::Find,
    };
    assert_eq!(
        deliver(&mut node, outbox, v(2), initiate).unwrap(),
        Disposition::Processed
    );
    node
}

// ── Wake-up ───────────────────────────────────────────────────────────

#[test]
fn test_wake_connects_along_lightest_edge() {
    let mut node = GhsNode::new(v(1));
    node.add_edge(v(2), w(5));
    node.add_edge(v(3), w(2));
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);

    assert_eq!(node.state(), ActivityState::Found);
    assert_eq!(node.level(), 0);
    assert!(node.edge_to(v(3)).unwrap().is_branch());
    assert!(node.edge_to(v(2)).unwrap().is_basic());
    assert_eq!(
        outbox,
        vec![Envelope::new(v(1), v(3), Message::Connect { level: 0 })]
    );
}

#[test]
fn test_wake_twice_is_rejected() {
    let mut node = star();
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);
    let mut ctx = SimulationContext::new(&mut outbox, None, 1);
    assert_eq!(node.wake(&mut ctx), Err(GhsError::AlreadyAwake(v(1))));
}

#[test]
fn test_isolated_vertex_halts_on_wake() {
    let mut node = GhsNode::new(v(9));
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);
    assert!(node.is_halted());
    assert!(outbox.is_empty());
}

#[test]
fn test_wake_records_trace() {
    let mut node = star();
    let mut outbox = Vec::new();
    let mut trace = Vec::new();
    let mut ctx = SimulationContext::new(&mut outbox, Some(&mut trace), 0);
    node.wake(&mut ctx).unwrap();

    assert_eq!(trace[0].event, TraceEvent::Woke);
    assert!(trace.iter().all(|e| e.node == v(1) && e.sweep == 0));
    assert!(trace.iter().any(|e| e.event
        == TraceEvent::EdgeClassified {
            edge: node.edge_to(v(2)).unwrap().id(),
            remote: v(2),
            from: EdgeState::Basic,
            to: EdgeState::Branch,
        }));
    assert!(trace.iter().any(|e| e.event
        == TraceEvent::Sent {
            to: v(2),
            message: Message::Connect { level: 0 },
        }));
}

// ── Connect ───────────────────────────────────────────────────────────

#[test]
fn test_connect_wakes_sleeping_node() {
    let mut node = star();
    let mut outbox = Vec::new();
    // Connect on a Basic edge at equal level: V1 wakes, then defers.
    let disposition = deliver(&mut node, &mut outbox, v(3), Message::Connect { level: 0 }).unwrap();

    assert_eq!(disposition, Disposition::Deferred);
    assert_eq!(node.state(), ActivityState::Found);
    assert_eq!(
        outbox,
        vec![Envelope::new(v(1), v(2), Message::Connect { level: 0 })]
    );
}

#[test]
fn test_connect_on_branch_merges() {
    let mut node = star();
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);
    outbox.clear();

    let disposition = deliver(&mut node, &mut outbox, v(2), Message::Connect { level: 0 }).unwrap();
    assert_eq!(disposition, Disposition::Processed);
    assert_eq!(
        outbox,
        vec![Envelope::new(
            v(1),
            v(2),
            Message::Initiate {
                level: 1,
                fragment: FragmentId::new(w(1)),
                state: ActivityState::Find,
            }
        )]
    );
}

#[test]
fn test_connect_from_lower_level_is_absorbed() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    assert_eq!(node.find_count(), 0);
    outbox.clear();

    let disposition = deliver(&mut node, &mut outbox, v(4), Message::Connect { level: 0 }).unwrap();
    assert_eq!(disposition, Disposition::Processed);
    assert!(node.edge_to(v(4)).unwrap().is_branch());
    assert_eq!(node.find_count(), 1);
    assert_eq!(
        outbox,
        vec![Envelope::new(
            v(1),
            v(4),
            Message::Initiate {
                level: 1,
                fragment: FragmentId::new(w(1)),
                state: ActivityState::Find,
            }
        )]
    );
}

// ── Initiate / Test ───────────────────────────────────────────────────

#[test]
fn test_initiate_starts_search() {
    let mut outbox = Vec::new();
    let node = searching_star(&mut outbox);

    assert_eq!(node.state(), ActivityState::Find);
    assert_eq!(node.level(), 1);
    assert_eq!(node.fragment(), Some(FragmentId::new(w(1))));
    assert_eq!(node.in_branch(), node.edge_to(v(2)).map(|e| e.id()));
    assert_eq!(node.test_edge(), node.edge_to(v(3)).map(|e| e.id()));
    assert_eq!(
        outbox.last(),
        Some(&Envelope::new(
            v(1),
            v(3),
            Message::Test {
                level: 1,
                fragment: FragmentId::new(w(1)),
            }
        ))
    );
}

#[test]
fn test_test_from_other_fragment_is_accepted() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    outbox.clear();

    let test = Message::Test {
        level: 0,
        fragment: FragmentId::new(w(7)),
    };
    deliver(&mut node, &mut outbox, v(4), test).unwrap();
    assert_eq!(outbox, vec![Envelope::new(v(1), v(4), Message::Accept)]);
    assert!(node.edge_to(v(4)).unwrap().is_basic());
}

#[test]
fn test_test_from_higher_level_is_deferred() {
    let mut node = star();
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);
    outbox.clear();

    let test = Message::Test {
        level: 1,
        fragment: FragmentId::new(w(9)),
    };
    assert_eq!(
        deliver(&mut node, &mut outbox, v(3), test).unwrap(),
        Disposition::Deferred
    );
    assert!(outbox.is_empty());
}

#[test]
fn test_test_from_same_fragment_is_rejected() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    outbox.clear();

    let test = Message::Test {
        level: 1,
        fragment: FragmentId::new(w(1)),
    };
    deliver(&mut node, &mut outbox, v(4), test).unwrap();
    assert_eq!(node.edge_to(v(4)).unwrap().state(), EdgeState::Rejected);
    assert_eq!(outbox, vec![Envelope::new(v(1), v(4), Message::Reject)]);
}

#[test]
fn test_mutual_test_moves_on_without_reply() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    outbox.clear();

    // V3 tests V1 on the very edge V1 is testing.
    let test = Message::Test {
        level: 1,
        fragment: FragmentId::new(w(1)),
    };
    deliver(&mut node, &mut outbox, v(3), test).unwrap();
    assert_eq!(node.edge_to(v(3)).unwrap().state(), EdgeState::Rejected);
    assert_eq!(node.test_edge(), node.edge_to(v(4)).map(|e| e.id()));
    assert_eq!(
        outbox,
        vec![Envelope::new(
            v(1),
            v(4),
            Message::Test {
                level: 1,
                fragment: FragmentId::new(w(1)),
            }
        )]
    );
}

// ── Accept / Reject ───────────────────────────────────────────────────

#[test]
fn test_accept_reports_best_weight() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    outbox.clear();

    deliver(&mut node, &mut outbox, v(3), Message::Accept).unwrap();
    assert_eq!(node.test_edge(), None);
    assert_eq!(node.state(), ActivityState::Found);
    assert_eq!(
        outbox,
        vec![Envelope::new(v(1), v(2), Message::Report { best: w(5) })]
    );
}

#[test]
fn test_reject_tests_next_edge() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    outbox.clear();

    deliver(&mut node, &mut outbox, v(3), Message::Reject).unwrap();
    assert_eq!(node.edge_to(v(3)).unwrap().state(), EdgeState::Rejected);
    assert_eq!(node.test_edge(), node.edge_to(v(4)).map(|e| e.id()));
}

#[test]
fn test_accept_without_test_is_violation() {
    let mut node = star();
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);

    let err = deliver(&mut node, &mut outbox, v(2), Message::Accept).unwrap_err();
    assert!(matches!(err, GhsError::ProtocolViolation { node, .. } if node == v(1)));
}

// ── Report / ChangeRoot ───────────────────────────────────────────────

#[test]
fn test_report_on_core_edge_waits_for_own_search() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    outbox.clear();

    let report = Message::Report { best: w(3) };
    assert_eq!(
        deliver(&mut node, &mut outbox, v(2), report).unwrap(),
        Disposition::Deferred
    );
    assert!(outbox.is_empty());
}

#[test]
fn test_report_without_child_is_violation() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);

    let report = Message::Report {
        best: Weight::INFINITY,
    };
    let err = deliver(&mut node, &mut outbox, v(3), report).unwrap_err();
    assert!(matches!(err, GhsError::ProtocolViolation { .. }));
}

#[test]
fn test_heavier_core_report_changes_root() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    deliver(&mut node, &mut outbox, v(3), Message::Accept).unwrap();
    outbox.clear();

    // The other half of the core found nothing: our side owns the best edge.
    let report = Message::Report {
        best: Weight::INFINITY,
    };
    deliver(&mut node, &mut outbox, v(2), report).unwrap();
    assert!(node.edge_to(v(3)).unwrap().is_branch());
    assert_eq!(
        outbox,
        vec![Envelope::new(v(1), v(3), Message::Connect { level: 1 })]
    );
}

#[test]
fn test_change_root_follows_branch_toward_best_child() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    // Absorb V4 as a child, then learn V3 is inside the fragment.
    deliver(&mut node, &mut outbox, v(4), Message::Connect { level: 0 }).unwrap();
    deliver(&mut node, &mut outbox, v(3), Message::Reject).unwrap();
    assert_eq!(node.find_count(), 1);
    assert_eq!(node.test_edge(), None);

    // The child's subtree holds the best outgoing edge.
    deliver(&mut node, &mut outbox, v(4), Message::Report { best: w(9) }).unwrap();
    assert_eq!(node.find_count(), 0);
    assert_eq!(node.state(), ActivityState::Found);
    assert_eq!(
        outbox.last(),
        Some(&Envelope::new(v(1), v(2), Message::Report { best: w(9) }))
    );
    outbox.clear();

    let report = Message::Report {
        best: Weight::INFINITY,
    };
    deliver(&mut node, &mut outbox, v(2), report).unwrap();
    assert_eq!(
        outbox,
        vec![Envelope::new(v(1), v(4), Message::ChangeRoot)]
    );
    assert!(node.edge_to(v(4)).unwrap().is_branch());
}

#[test]
fn test_change_root_connects_over_best_basic_edge() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    deliver(&mut node, &mut outbox, v(3), Message::Accept).unwrap();
    outbox.clear();

    let disposition = deliver(&mut node, &mut outbox, v(2), Message::ChangeRoot).unwrap();
    assert_eq!(disposition, Disposition::Processed);
    assert_eq!(node.edge_to(v(3)).unwrap().state(), EdgeState::Branch);
    assert_eq!(
        outbox,
        vec![Envelope::new(v(1), v(3), Message::Connect { level: 1 })]
    );
}

#[test]
fn test_change_root_without_best_edge_is_violation() {
    let mut outbox = Vec::new();
    let mut node = searching_star(&mut outbox);
    let err = deliver(&mut node, &mut outbox, v(2), Message::ChangeRoot).unwrap_err();
    assert!(matches!(err, GhsError::ProtocolViolation { .. }));
}

#[test]
fn test_both_core_reports_infinite_halts() {
    let mut node = GhsNode::new(v(1));
    node.add_edge(v(2), w(1));
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);
    let initiate = Message::Initiate {
        level: 1,
        fragment: FragmentId::new(w(1)),
        state: ActivityState::Find,
    };
    deliver(&mut node, &mut outbox, v(2), initiate).unwrap();
    assert_eq!(
        outbox.last(),
        Some(&Envelope::new(
            v(1),
            v(2),
            Message::Report {
                best: Weight::INFINITY
            }
        ))
    );

    let report = Message::Report {
        best: Weight::INFINITY,
    };
    deliver(&mut node, &mut outbox, v(2), report).unwrap();
    assert!(node.is_halted());
}

// ── Dispatch ──────────────────────────────────────────────────────────

#[test]
fn test_message_from_non_neighbor_is_violation() {
    let mut node = star();
    let mut outbox = Vec::new();
    let err = deliver(&mut node, &mut outbox, v(8), Message::Connect { level: 0 }).unwrap_err();
    assert!(matches!(err, GhsError::ProtocolViolation { .. }));
    assert!(node.is_sleeping());
}

#[test]
fn test_take_turn_requeues_deferred_message() {
    let mut node = star();
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);
    outbox.clear();

    // Not actionable: Basic edge at equal level.
    node.push_message(Envelope::new(v(3), v(1), Message::Connect { level: 0 }));
    // Actionable: merge over the Branch edge to V2.
    node.push_message(Envelope::new(v(2), v(1), Message::Connect { level: 0 }));

    let mut ctx = SimulationContext::new(&mut outbox, None, 1);
    let turn = node.take_turn(&mut ctx).unwrap();
    assert!(turn.processed);
    assert_eq!(turn.deferred, 1);
    assert_eq!(node.queue_len(), 1);
    assert_eq!(outbox.len(), 1);
}

#[test]
fn test_take_turn_stops_after_full_pass() {
    let mut node = star();
    let mut outbox = Vec::new();
    wake(&mut node, &mut outbox);

    node.push_message(Envelope::new(v(3), v(1), Message::Connect { level: 0 }));
    node.push_message(Envelope::new(v(4), v(1), Message::Connect { level: 0 }));

    let mut ctx = SimulationContext::new(&mut outbox, None, 1);
    let turn = node.take_turn(&mut ctx).unwrap();
    assert!(!turn.processed);
    assert_eq!(turn.deferred, 2);
    assert_eq!(node.queue_len(), 2);
}
