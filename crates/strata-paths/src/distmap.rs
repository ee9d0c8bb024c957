use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use strata_core::{Queue64, key_from_f64};

use crate::frontier::PendingFrontier;
use crate::traits::WeightedGraph;

/// Outcome of relaxing one edge against the map.
pub(crate) enum Relaxed {
    /// Strict improvement: the target's distance dropped.
    Improved,
    /// Exact tie: the source joined the target's predecessor set.
    Tied,
    /// The candidate was worse; nothing changed.
    Worse,
}

/// A single-source shortest-distance map with full predecessor tracking.
///
/// Built by a Dijkstra-style label-correcting loop. For every reached node
/// the map records the minimal known distance from `start` and *all*
/// immediate predecessors achieving it (in first-inserted order), which is
/// what makes enumeration of every equal-cost path possible.
///
/// The map only ever grows. Distances of [settled](Self::is_settled) nodes
/// are final; a node that was reached but then cut off by a distance bound
/// keeps a tentative entry and sits in the solve's [`PendingFrontier`]
/// until a later pass resumes it.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound(
        serialize = "N: serde::Serialize + Eq + std::hash::Hash",
        deserialize = "N: serde::Deserialize<'de> + Eq + std::hash::Hash"
    ))
)]
pub struct DistanceMap<N> {
    start: N,
    distances: HashMap<N, f64>,
    predecessors: HashMap<N, Vec<N>>,
    settled: HashSet<N>,
}

impl<N: Clone + Eq + Hash> DistanceMap<N> {
    /// Create an empty map: only `start`, at distance zero.
    pub fn new(start: N) -> Self {
        let mut distances = HashMap::new();
        distances.insert(start.clone(), 0.0);
        Self {
            start,
            distances,
            predecessors: HashMap::new(),
            settled: HashSet::new(),
        }
    }

    /// Solve from `start`, expanding every node whose distance does not
    /// exceed `max_distance` (pass `f64::INFINITY` for no bound).
    pub fn solve<G>(graph: &G, start: N, max_distance: f64) -> Self
    where
        G: WeightedGraph<Node = N>,
    {
        let mut map = Self::new(start.clone());
        let mut pending = PendingFrontier::seeded(start);
        map.expand(graph, None, max_distance, &mut pending);
        map
    }

    /// Solve from `start` toward a single `goal`.
    ///
    /// Once the goal is settled its distance becomes an additional bound:
    /// frontier nodes strictly beyond it are pruned. That is purely an
    /// optimization — distances and predecessor sets of nodes within the
    /// effective budget come out identical to an unbounded solve.
    pub fn solve_to<G>(graph: &G, start: N, goal: &N, max_distance: f64) -> Self
    where
        G: WeightedGraph<Node = N>,
    {
        let mut map = Self::new(start.clone());
        let mut pending = PendingFrontier::seeded(start);
        map.expand(graph, Some(goal), max_distance, &mut pending);
        map
    }

    /// Continue a paused solve from its pending frontier, typically under
    /// a larger bound. Distances already settled are reused, not redone.
    pub fn resume<G>(
        &mut self,
        graph: &G,
        goal: Option<&N>,
        max_distance: f64,
        pending: &mut PendingFrontier<N>,
    ) where
        G: WeightedGraph<Node = N>,
    {
        self.expand(graph, goal, max_distance, pending);
    }

    fn expand<G>(
        &mut self,
        graph: &G,
        goal: Option<&N>,
        max_distance: f64,
        pending: &mut PendingFrontier<N>,
    ) where
        G: WeightedGraph<Node = N>,
    {
        let mut limit = max_distance;
        if let Some(goal) = goal
            && self.settled.contains(goal)
            && let Some(d) = self.distance(goal)
        {
            limit = limit.min(d);
        }

        let mut frontier: Queue64<(N, f64)> = Queue64::new();
        for node in pending.take() {
            if let Some(g) = self.distance(&node) {
                frontier.push(key_from_f64(g), (node, g));
            }
        }

        let mut ebuf: Vec<(N, f64)> = Vec::new();
        while let Some((_, (node, g))) = frontier.pop() {
            match self.distance(&node) {
                Some(d) if d == g => {}
                _ => continue, // stale entry, superseded by an improvement
            }
            if g > limit {
                pending.insert(node);
                continue;
            }
            self.settled.insert(node.clone());
            if let Some(goal) = goal
                && node == *goal
            {
                limit = limit.min(g);
            }

            ebuf.clear();
            graph.edges(&node, &mut ebuf);
            for (next, weight) in ebuf.drain(..) {
                assert!(weight > 0.0, "edge weight must be strictly positive");
                let cand = g + weight;
                if cand > limit {
                    pending.insert(node.clone());
                    continue;
                }
                if let Relaxed::Improved = self.relax(&node, next.clone(), cand) {
                    frontier.push(key_from_f64(cand), (next, cand));
                }
            }
        }
    }

    /// Relax the edge `from → to` with candidate distance `cand`.
    pub(crate) fn relax(&mut self, from: &N, to: N, cand: f64) -> Relaxed {
        match self.distances.get(&to) {
            Some(&d) if cand > d => Relaxed::Worse,
            Some(&d) if cand == d => {
                let preds = self.predecessors.entry(to).or_default();
                if !preds.iter().any(|p| p == from) {
                    preds.push(from.clone());
                }
                Relaxed::Tied
            }
            _ => {
                self.distances.insert(to.clone(), cand);
                self.predecessors.insert(to, vec![from.clone()]);
                Relaxed::Improved
            }
        }
    }

    pub(crate) fn mark_settled(&mut self, node: N) {
        self.settled.insert(node);
    }

    /// The start node.
    pub fn start(&self) -> &N {
        &self.start
    }

    /// The minimal known distance from start to `node`, if reached.
    pub fn distance(&self, node: &N) -> Option<f64> {
        self.distances.get(node).copied()
    }

    /// Every reached node with its minimal known distance.
    pub fn distances(&self) -> &HashMap<N, f64> {
        &self.distances
    }

    /// All immediate predecessors of `node` achieving its minimal
    /// distance, in first-inserted order. Empty for the start node and
    /// for unreached nodes.
    pub fn predecessors(&self, node: &N) -> &[N] {
        self.predecessors.get(node).map_or(&[], Vec::as_slice)
    }

    /// Whether `node`'s distance is final (it was expanded, not merely
    /// reached before a bound cut the solve short).
    pub fn is_settled(&self, node: &N) -> bool {
        self.settled.contains(node)
    }

    /// The shortest path from start to `goal`, both endpoints included.
    ///
    /// Follows predecessors backward, picking the first-inserted one at
    /// each step — a deterministic choice among equal-cost alternatives.
    /// Empty if `goal` was not reached.
    pub fn path(&self, goal: &N) -> Vec<N> {
        if !self.distances.contains_key(goal) {
            return Vec::new();
        }
        let mut path = vec![goal.clone()];
        let mut cur = goal;
        while *cur != self.start {
            match self.predecessors.get(cur).and_then(|p| p.first()) {
                Some(prev) => {
                    path.push(prev.clone());
                    cur = prev;
                }
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }

    /// Enumerate every minimal-cost path from start to `goal` by
    /// depth-first expansion of the predecessor sets, writing at most
    /// `limit` paths into `out` and returning how many were written.
    /// Paths beyond `limit` are silently dropped — callers needing
    /// completeness should size `limit` generously and re-query when the
    /// returned count hits it.
    pub fn paths_into(&self, goal: &N, out: &mut Vec<Vec<N>>, limit: usize) -> usize {
        out.clear();
        if limit == 0 || !self.distances.contains_key(goal) {
            return 0;
        }
        let mut tail = Vec::new();
        self.collect_paths(goal, &mut tail, out, limit);
        out.len()
    }

    // Walks predecessor sets in first-inserted order; `tail` holds the
    // reversed suffix from the goal down to `node`.
    fn collect_paths(&self, node: &N, tail: &mut Vec<N>, out: &mut Vec<Vec<N>>, limit: usize) {
        if out.len() == limit {
            return;
        }
        tail.push(node.clone());
        if *node == self.start {
            out.push(tail.iter().rev().cloned().collect());
        } else if let Some(preds) = self.predecessors.get(node) {
            for prev in preds {
                self.collect_paths(prev, tail, out, limit);
            }
        }
        tail.pop();
    }
}
