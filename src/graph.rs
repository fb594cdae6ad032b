//! Graph descriptions, spanning trees and the Kruskal reference oracle.
//!
//! The simulation never sees a [`Graph`]: it is the driver-side view used
//! to build the network, to parse the textual input format and to check
//! the protocol's answer against a sequential algorithm.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::edge::Weight;
use crate::error::{GhsError, GhsResult};
use crate::node::NodeId;

/// Largest vertex count accepted from a textual description or the generator.
pub const MAX_VERTICES: usize = 1 << 20;

// ── GraphEdge ─────────────────────────────────────────────────────────

/// An undirected weighted edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphEdge {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: Weight,
}

impl GraphEdge {
    /// Endpoints are stored in ascending order.
    pub fn new(a: NodeId, b: NodeId, weight: Weight) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        GraphEdge { a, b, weight }
    }
}

impl std::fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} (w={})", self.a, self.b, self.weight)
    }
}

// ── SpanningTree ──────────────────────────────────────────────────────

/// A set of tree edges, sorted by weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SpanningTree {
    edges: Vec<GraphEdge>,
    total_weight: i128,
}

impl SpanningTree {
    pub fn from_edges(mut edges: Vec<GraphEdge>) -> Self {
        edges.sort_by_key(|e| (e.weight, e.a, e.b));
        let total_weight = edges.iter().map(|e| e.weight.raw() as i128).sum();
        SpanningTree {
            edges,
            total_weight,
        }
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Sum of all edge weights.
    pub fn total_weight(&self) -> i128 {
        self.total_weight
    }

    /// Edge weights in ascending order. Distinct weights make this a
    /// complete fingerprint of the tree.
    pub fn weights(&self) -> Vec<Weight> {
        self.edges.iter().map(|e| e.weight).collect()
    }
}

// ── Graph ─────────────────────────────────────────────────────────────

/// A validated, undirected graph on vertices `V1..=Vn`.
///
/// Rejects self loops, parallel edges and repeated weights as they are
/// added, so every `Graph` satisfies the protocol's input assumptions
/// (apart from connectivity, which the run itself detects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    vertex_count: usize,
    edges: Vec<GraphEdge>,
    pairs: BTreeSet<(NodeId, NodeId)>,
    weights: BTreeSet<Weight>,
}

impl Graph {
    /// A graph with `vertex_count` vertices and no edges.
    pub fn new(vertex_count: usize) -> Self {
        Graph {
            vertex_count,
            ..Graph::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Vertex ids in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = NodeId> {
        (1..=self.vertex_count as u64).map(NodeId::new)
    }

    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: Weight) -> GhsResult<()> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if a == b {
            return Err(GhsError::SelfLoop(a));
        }
        if weight.is_infinite() {
            return Err(GhsError::ReservedWeight(weight));
        }
        let edge = GraphEdge::new(a, b, weight);
        if self.pairs.contains(&(edge.a, edge.b)) {
            return Err(GhsError::DuplicateEdge { a: edge.a, b: edge.b });
        }
        if self.weights.contains(&weight) {
            return Err(GhsError::DuplicateWeight(weight));
        }
        self.pairs.insert((edge.a, edge.b));
        self.weights.insert(weight);
        self.edges.push(edge);
        Ok(())
    }

    fn check_vertex(&self, v: NodeId) -> GhsResult<()> {
        if v.raw() == 0 || v.raw() > self.vertex_count as u64 {
            return Err(GhsError::VertexOutOfRange {
                vertex: v.raw(),
                vertex_count: self.vertex_count,
            });
        }
        Ok(())
    }

    /// Parse the textual format: `n m` followed by `m` triples `a b w`,
    /// all whitespace-separated, vertices numbered from 1.
    pub fn parse(input: &str) -> GhsResult<Self> {
        let mut tokens = input.split_whitespace();
        let n: usize = next_number(&mut tokens, "vertex count")?;
        let m: usize = next_number(&mut tokens, "edge count")?;
        check_vertex_count(n)?;

        let mut graph = Graph::new(n);
        for i in 1..=m {
            let a: u64 = next_number(&mut tokens, &format!("endpoint A of edge {}", i))?;
            let b: u64 = next_number(&mut tokens, &format!("endpoint B of edge {}", i))?;
            let w: i64 = next_number(&mut tokens, &format!("weight of edge {}", i))?;
            graph.add_edge(NodeId::new(a), NodeId::new(b), Weight::new(w))?;
        }
        if let Some(extra) = tokens.next() {
            return Err(GhsError::MalformedInput {
                reason: format!("unexpected trailing token {:?} after {} edges", extra, m),
            });
        }
        Ok(graph)
    }

    /// Render in the format accepted by [`Graph::parse`].
    pub fn to_text(&self) -> String {
        let mut out = format!("{} {}\n", self.vertex_count, self.edges.len());
        for e in &self.edges {
            out.push_str(&format!("{} {} {}\n", e.a.raw(), e.b.raw(), e.weight.raw()));
        }
        out
    }

    /// Sequential minimum spanning tree (Kruskal with union-find).
    ///
    /// Returns `None` when the graph is disconnected.
    pub fn kruskal(&self) -> Option<SpanningTree> {
        let mut sorted: Vec<GraphEdge> = self.edges.clone();
        sorted.sort_by_key(|e| e.weight);

        let mut uf = UnionFind::new(self.vertex_count.checked_add(1)?);
        let mut tree = Vec::with_capacity(self.vertex_count.saturating_sub(1));
        for e in sorted {
            if uf.union(e.a.raw() as usize, e.b.raw() as usize) {
                tree.push(e);
                if tree.len() + 1 == self.vertex_count {
                    break;
                }
            }
        }

        if tree.len() + 1 == self.vertex_count.max(1) {
            Some(SpanningTree::from_edges(tree))
        } else {
            None
        }
    }
}

impl FromStr for Graph {
    type Err = GhsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Graph::parse(s)
    }
}

/// Reject vertex counts the simulation cannot hold.
pub(crate) fn check_vertex_count(n: usize) -> GhsResult<()> {
    if n == 0 {
        return Err(GhsError::MalformedInput {
            reason: "graph must have at least one vertex".into(),
        });
    }
    if n > MAX_VERTICES {
        return Err(GhsError::MalformedInput {
            reason: format!("{} vertices exceeds the limit of {}", n, MAX_VERTICES),
        });
    }
    Ok(())
}

fn next_number<'a, T: FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> GhsResult<T> {
    let token = tokens.next().ok_or_else(|| GhsError::MalformedInput {
        reason: format!("missing {}", what),
    })?;
    token.parse().map_err(|_| GhsError::MalformedInput {
        reason: format!("invalid {}: {:?}", what, token),
    })
}

// ── Union-Find ────────────────────────────────────────────────────────

/// Disjoint sets with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    /// Returns `false` if `x` and `y` were already joined.
    fn union(&mut self, x: usize, y: usize) -> bool {
        let px = self.find(x);
        let py = self.find(y);
        if px == py {
            return false;
        }
        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
        true
    }
}
