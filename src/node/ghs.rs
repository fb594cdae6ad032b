//! `GhsNode` — the per-vertex GHS protocol state machine.
//!
//! A node knows only its own incident edges. Everything it learns about
//! the rest of the graph arrives as a [`Message`] on its private queue,
//! and everything it does to the rest of the graph leaves through
//! [`SimulationContext::send`]. Handler chains such as
//! `on_accept → do_report` run synchronously inside one node turn.

use std::collections::VecDeque;

use crate::edge::{Edge, EdgeId, EdgeState, Weight};
use crate::error::{GhsError, GhsResult};
use crate::simulation::SimulationContext;

use super::id::NodeId;
use super::payload::{Envelope, Message};
use super::state::{ActivityState, FragmentId, Level};
use super::trace::TraceEvent;

/// Result of offering one queued message to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The message was consumed.
    Processed,
    /// Local state is not ready yet; the message goes back to the tail.
    Deferred,
}

/// What a node achieved during one scheduler turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Whether a message was consumed (at most one per turn).
    pub processed: bool,
    /// Messages declined and re-enqueued during the turn.
    pub deferred: u64,
}

/// One vertex of the simulated network.
#[derive(Debug, Clone)]
pub struct GhsNode {
    id: NodeId,
    edges: Vec<Edge>,
    state: ActivityState,
    level: Level,
    fragment: Option<FragmentId>,
    best_edge: Option<EdgeId>,
    best_weight: Weight,
    test_edge: Option<EdgeId>,
    in_branch: Option<EdgeId>,
    find_count: u32,
    queue: VecDeque<Envelope>,
}

impl GhsNode {
    /// A sleeping node with no edges.
    pub fn new(id: NodeId) -> Self {
        GhsNode {
            id,
            edges: Vec::new(),
            state: ActivityState::Sleeping,
            level: 0,
            fragment: None,
            best_edge: None,
            best_weight: Weight::INFINITY,
            test_edge: None,
            in_branch: None,
            find_count: 0,
            queue: VecDeque::new(),
        }
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Current fragment identity, `None` until the first `Initiate`.
    pub fn fragment(&self) -> Option<FragmentId> {
        self.fragment
    }

    /// Edge toward the fragment core.
    pub fn in_branch(&self) -> Option<EdgeId> {
        self.in_branch
    }

    pub fn test_edge(&self) -> Option<EdgeId> {
        self.test_edge
    }

    /// Outstanding child reports.
    pub fn find_count(&self) -> u32 {
        self.find_count
    }

    pub fn is_sleeping(&self) -> bool {
        self.state == ActivityState::Sleeping
    }

    pub fn is_halted(&self) -> bool {
        self.state == ActivityState::Halted
    }

    /// Number of messages waiting in this node's queue.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The local record of the edge leading to `remote`, if any.
    pub fn edge_to(&self, remote: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.remote() == remote)
    }

    /// Edges this node has classified as `Branch`.
    pub fn branch_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(|e| e.is_branch())
    }

    // ── Topology / delivery ───────────────────────────────────

    /// Append an incident edge. Returns its local id.
    pub fn add_edge(&mut self, remote: NodeId, weight: Weight) -> EdgeId {
        let id = EdgeId::new(self.edges.len());
        self.edges.push(Edge::new(id, remote, weight));
        id
    }

    /// Put a message at the tail of this node's queue.
    pub fn push_message(&mut self, envelope: Envelope) {
        self.queue.push_back(envelope);
    }

    // ── Scheduling ────────────────────────────────────────────

    /// Give this node one turn.
    ///
    /// Queued messages are offered in order. A deferred message goes back
    /// to the tail and the next one is tried; the turn ends at the first
    /// processed message or once every message present at the start of
    /// the turn has been offered.
    pub fn take_turn(&mut self, ctx: &mut SimulationContext<'_>) -> GhsResult<TurnOutcome> {
        let mut outcome = TurnOutcome::default();
        let mut remaining = self.queue.len();
        while remaining > 0 {
            remaining -= 1;
            let Some(envelope) = self.queue.pop_front() else {
                break;
            };
            match self.handle(ctx, &envelope)? {
                Disposition::Processed => {
                    ctx.record(
                        self.id,
                        TraceEvent::Processed {
                            from: envelope.from,
                            message: envelope.message,
                        },
                    );
                    outcome.processed = true;
                    break;
                }
                Disposition::Deferred => {
                    tracing::trace!(node = %self.id, from = %envelope.from, message = %envelope.message, "deferred");
                    ctx.record(
                        self.id,
                        TraceEvent::Deferred {
                            from: envelope.from,
                            message: envelope.message,
                        },
                    );
                    self.queue.push_back(envelope);
                    outcome.deferred += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Dispatch one message to its handler.
    pub fn handle(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        envelope: &Envelope,
    ) -> GhsResult<Disposition> {
        let j = self
            .edge_to(envelope.from)
            .map(Edge::id)
            .ok_or_else(|| {
                GhsError::violation(
                    self.id,
                    format!("{} arrived from non-neighbor {}", envelope.message, envelope.from),
                )
            })?;

        match envelope.message {
            Message::Connect { level } => self.on_connect(ctx, j, level),
            Message::Initiate {
                level,
                fragment,
                state,
            } => self.on_initiate(ctx, j, level, fragment, state),
            Message::Test { level, fragment } => self.on_test(ctx, j, level, fragment),
            Message::Accept => self.on_accept(ctx, j),
            Message::Reject => self.on_reject(ctx, j),
            Message::Report { best } => self.on_report(ctx, j, best),
            Message::ChangeRoot => self.on_change_root(ctx, j),
        }
    }

    // ── Protocol ──────────────────────────────────────────────

    /// Join the protocol: become a level-0 fragment and try to connect
    /// along the lightest incident edge.
    ///
    /// A vertex without edges is already a complete fragment and halts.
    pub fn wake(&mut self, ctx: &mut SimulationContext<'_>) -> GhsResult<()> {
        if !self.is_sleeping() {
            return Err(GhsError::AlreadyAwake(self.id));
        }
        tracing::info!(node = %self.id, "wake up");
        ctx.record(self.id, TraceEvent::Woke);

        self.set_level(ctx, 0);
        self.fragment = None;
        self.set_state(ctx, ActivityState::Found);
        self.find_count = 0;
        self.best_edge = None;
        self.best_weight = Weight::INFINITY;
        self.test_edge = None;
        self.in_branch = None;

        match self.min_edge(|_| true) {
            Some(m) => {
                self.classify(ctx, m, EdgeState::Branch)?;
                self.send(ctx, m, Message::Connect { level: 0 });
            }
            None => self.halt(ctx),
        }
        Ok(())
    }

    fn on_connect(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        j: EdgeId,
        level: Level,
    ) -> GhsResult<Disposition> {
        if self.is_sleeping() {
            self.wake(ctx)?;
        }
        if level < self.level {
            // Absorb the lower-level fragment.
            self.classify(ctx, j, EdgeState::Branch)?;
            let fragment = self.require_fragment("absorbing a fragment")?;
            self.send(
                ctx,
                j,
                Message::Initiate {
                    level: self.level,
                    fragment,
                    state: self.state,
                },
            );
            if self.state == ActivityState::Find {
                self.find_count += 1;
            }
        } else if self.edge(j).is_basic() {
            return Ok(Disposition::Deferred);
        } else {
            // Both ends chose this edge: merge around it as the new core.
            let core = self.edge(j).weight();
            self.send(
                ctx,
                j,
                Message::Initiate {
                    level: self.level + 1,
                    fragment: FragmentId::new(core),
                    state: ActivityState::Find,
                },
            );
        }
        Ok(Disposition::Processed)
    }

    fn on_initiate(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        j: EdgeId,
        level: Level,
        fragment: FragmentId,
        state: ActivityState,
    ) -> GhsResult<Disposition> {
        self.set_level(ctx, level);
        self.set_fragment(ctx, fragment);
        self.set_state(ctx, state);
        self.in_branch = Some(j);
        self.best_edge = None;
        self.best_weight = Weight::INFINITY;

        let children: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|e| e.id() != j && e.is_branch())
            .map(Edge::id)
            .collect();
        for child in children {
            self.send(
                ctx,
                child,
                Message::Initiate {
                    level,
                    fragment,
                    state,
                },
            );
            if state == ActivityState::Find {
                self.find_count += 1;
            }
        }
        if state == ActivityState::Find {
            self.do_test(ctx)?;
        }
        Ok(Disposition::Processed)
    }

    fn do_test(&mut self, ctx: &mut SimulationContext<'_>) -> GhsResult<()> {
        self.test_edge = self.min_edge(Edge::is_basic);
        match self.test_edge {
            Some(t) => {
                let fragment = self.require_fragment("testing an edge")?;
                self.send(
                    ctx,
                    t,
                    Message::Test {
                        level: self.level,
                        fragment,
                    },
                );
                Ok(())
            }
            None => self.do_report(ctx),
        }
    }

    fn do_report(&mut self, ctx: &mut SimulationContext<'_>) -> GhsResult<()> {
        if self.find_count == 0 && self.test_edge.is_none() {
            let in_branch = self.require_in_branch("reporting")?;
            self.set_state(ctx, ActivityState::Found);
            self.send(
                ctx,
                in_branch,
                Message::Report {
                    best: self.best_weight,
                },
            );
        }
        Ok(())
    }

    fn on_test(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        j: EdgeId,
        level: Level,
        fragment: FragmentId,
    ) -> GhsResult<Disposition> {
        if self.is_sleeping() {
            self.wake(ctx)?;
        }
        if level > self.level {
            return Ok(Disposition::Deferred);
        }
        if self.fragment != Some(fragment) {
            self.send(ctx, j, Message::Accept);
        } else {
            if self.edge(j).is_basic() {
                self.classify(ctx, j, EdgeState::Rejected)?;
            }
            if self.test_edge != Some(j) {
                self.send(ctx, j, Message::Reject);
            } else {
                // Both ends tested each other: no reply needed, move on.
                self.do_test(ctx)?;
            }
        }
        Ok(Disposition::Processed)
    }

    fn on_accept(&mut self, ctx: &mut SimulationContext<'_>, j: EdgeId) -> GhsResult<Disposition> {
        if self.test_edge.is_none() {
            return Err(GhsError::violation(self.id, "Accept with no outstanding test"));
        }
        self.test_edge = None;
        let w = self.edge(j).weight();
        if w < self.best_weight {
            self.best_edge = Some(j);
            self.best_weight = w;
        }
        self.do_report(ctx)?;
        Ok(Disposition::Processed)
    }

    fn on_reject(&mut self, ctx: &mut SimulationContext<'_>, j: EdgeId) -> GhsResult<Disposition> {
        if self.test_edge.is_none() {
            return Err(GhsError::violation(self.id, "Reject with no outstanding test"));
        }
        if self.edge(j).is_basic() {
            self.classify(ctx, j, EdgeState::Rejected)?;
        }
        self.do_test(ctx)?;
        Ok(Disposition::Processed)
    }

    fn on_report(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        j: EdgeId,
        best: Weight,
    ) -> GhsResult<Disposition> {
        let in_branch = self.require_in_branch("receiving a report")?;
        if j != in_branch {
            self.find_count = self
                .find_count
                .checked_sub(1)
                .ok_or_else(|| GhsError::violation(self.id, "Report with no outstanding child"))?;
            if best < self.best_weight {
                self.best_edge = Some(j);
                self.best_weight = best;
            }
            self.do_report(ctx)?;
        } else if self.state == ActivityState::Find {
            return Ok(Disposition::Deferred);
        } else if best > self.best_weight {
            // The fragment's best outgoing edge is on this side of the core.
            self.do_change_root(ctx)?;
        } else if best.is_infinite() && self.best_weight.is_infinite() {
            self.halt(ctx);
        }
        Ok(Disposition::Processed)
    }

    fn do_change_root(&mut self, ctx: &mut SimulationContext<'_>) -> GhsResult<()> {
        let best = self
            .best_edge
            .ok_or_else(|| GhsError::violation(self.id, "ChangeRoot with no best edge"))?;
        if self.edge(best).is_branch() {
            self.send(ctx, best, Message::ChangeRoot);
        } else {
            self.send(ctx, best, Message::Connect { level: self.level });
            self.classify(ctx, best, EdgeState::Branch)?;
        }
        Ok(())
    }

    fn on_change_root(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        _j: EdgeId,
    ) -> GhsResult<Disposition> {
        self.do_change_root(ctx)?;
        Ok(Disposition::Processed)
    }

    fn halt(&mut self, ctx: &mut SimulationContext<'_>) {
        tracing::info!(node = %self.id, level = self.level, "halt: no outgoing edge left");
        self.set_state(ctx, ActivityState::Halted);
        ctx.record(self.id, TraceEvent::Halted);
    }

    // ── Helpers ───────────────────────────────────────────────

    /// Edge ids are only ever produced by this node, so indexing is in bounds.
    fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    fn min_edge(&self, pred: impl Fn(&Edge) -> bool) -> Option<EdgeId> {
        self.edges
            .iter()
            .filter(|&e| pred(e))
            .min_by_key(|e| e.weight())
            .map(Edge::id)
    }

    fn send(&mut self, ctx: &mut SimulationContext<'_>, via: EdgeId, message: Message) {
        let to = self.edge(via).remote();
        ctx.send(Envelope::new(self.id, to, message));
    }

    fn classify(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        id: EdgeId,
        next: EdgeState,
    ) -> GhsResult<()> {
        let node = self.id;
        let edge = &mut self.edges[id.index()];
        let from = edge.state();
        let changed = edge
            .classify(next)
            .map_err(|e| GhsError::IllegalEdgeTransition {
                node,
                edge: id,
                from: e.from,
                to: e.to,
            })?;
        if changed {
            ctx.record(
                node,
                TraceEvent::EdgeClassified {
                    edge: id,
                    remote: edge.remote(),
                    from,
                    to: next,
                },
            );
        }
        Ok(())
    }

    fn set_state(&mut self, ctx: &mut SimulationContext<'_>, next: ActivityState) {
        if self.state != next {
            ctx.record(
                self.id,
                TraceEvent::StateChanged {
                    from: self.state,
                    to: next,
                },
            );
            self.state = next;
        }
    }

    fn set_level(&mut self, ctx: &mut SimulationContext<'_>, level: Level) {
        self.level = level;
        ctx.record(self.id, TraceEvent::LevelChanged(level));
    }

    fn set_fragment(&mut self, ctx: &mut SimulationContext<'_>, fragment: FragmentId) {
        self.fragment = Some(fragment);
        ctx.record(self.id, TraceEvent::FragmentChanged(fragment));
    }

    fn require_fragment(&self, doing: &str) -> GhsResult<FragmentId> {
        self.fragment
            .ok_or_else(|| GhsError::violation(self.id, format!("no fragment identity while {}", doing)))
    }

    fn require_in_branch(&self, doing: &str) -> GhsResult<EdgeId> {
        self.in_branch
            .ok_or_else(|| GhsError::violation(self.id, format!("no in-branch while {}", doing)))
    }
}
