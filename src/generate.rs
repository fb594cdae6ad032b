/// Seeded graph generation for tests and the command-line driver.
///
/// Every graph is a function of its seed alone: the same `(n, extra,
/// seed)` triple produces the same vertices, edges and weights on every
/// platform.

use std::collections::BTreeSet;

use crate::edge::Weight;
use crate::error::GhsResult;
use crate::graph::{check_vertex_count, Graph, MAX_VERTICES};
use crate::node::NodeId;

// ── Deterministic RNG ─────────────────────────────────────────────────

/// SplitMix64. Identical sequences for a given seed across platforms.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        DeterministicRng { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Uniform value in `[min, max)`; `min` when the range is empty.
    pub fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(0, i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }
}

// ── Generators ────────────────────────────────────────────────────────

/// A connected graph on `n` vertices: a random spanning tree plus up to
/// `extra` further edges, with weights a shuffled permutation of `1..=m`.
///
/// `extra` is capped at the number of vertex pairs the tree leaves free.
pub fn random_connected(n: usize, extra: usize, seed: u64) -> GhsResult<Graph> {
    check_vertex_count(n)?;
    let mut rng = DeterministicRng::new(seed);
    let mut pairs: BTreeSet<(u64, u64)> = BTreeSet::new();
    let mut order: Vec<(u64, u64)> = Vec::new();

    // Random recursive tree: every vertex hangs off an earlier one.
    for v in 2..=n as u64 {
        let parent = rng.next_range(1, v);
        pairs.insert((parent, v));
        order.push((parent, v));
    }

    let total_pairs = n * (n - 1) / 2;
    let extra = extra.min(total_pairs - order.len());
    if extra * 2 <= total_pairs - order.len() {
        // Sparse: rejection sampling terminates quickly.
        while order.len() < n - 1 + extra {
            let a = rng.next_range(1, n as u64 + 1);
            let b = rng.next_range(1, n as u64 + 1);
            let pair = (a.min(b), a.max(b));
            if a != b && pairs.insert(pair) {
                order.push(pair);
            }
        }
    } else {
        let mut free: Vec<(u64, u64)> = (1..=n as u64)
            .flat_map(|a| (a + 1..=n as u64).map(move |b| (a, b)))
            .filter(|p| !pairs.contains(p))
            .collect();
        rng.shuffle(&mut free);
        order.extend(free.into_iter().take(extra));
    }

    let mut weights: Vec<i64> = (1..=order.len() as i64).collect();
    rng.shuffle(&mut weights);

    let mut graph = Graph::new(n);
    for ((a, b), w) in order.into_iter().zip(weights) {
        graph.add_edge(NodeId::new(a), NodeId::new(b), Weight::new(w))?;
    }
    tracing::debug!(
        vertices = n,
        edges = graph.edge_count(),
        seed,
        "generated random connected graph"
    );
    Ok(graph)
}
