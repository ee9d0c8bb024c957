use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use log::{debug, trace};
use strata_core::{DualKeyedQueue, key_from_f64};

use crate::astar::AstarSearch;
use crate::distmap::DistanceMap;
use crate::frontier::PendingFrontier;
use crate::joiner::join_path;
use crate::traits::{HeuristicGraph, WeightedGraph};

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// One cluster of the cover: a root node plus the bounded distance map
/// solved from it. The map reaches every node within `batch_radius` of
/// the root, extended by a wider halo (up to `batch_edge_length`) used
/// only to connect neighboring clusters, never to claim ownership.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound(
        serialize = "N: serde::Serialize + Eq + std::hash::Hash",
        deserialize = "N: serde::Deserialize<'de> + Eq + std::hash::Hash"
    ))
)]
pub struct Batch<N> {
    root: N,
    map: DistanceMap<N>,
    pending: PendingFrontier<N>,
}

impl<N: Clone + Eq + Hash> Batch<N> {
    /// The cluster's root node.
    pub fn root(&self) -> &N {
        &self.root
    }

    /// The distance map rooted at this cluster's root.
    pub fn map(&self) -> &DistanceMap<N> {
        &self.map
    }

    /// The resumption frontier left by the halo-bounded solve. A later
    /// pass could widen the cluster's map from here without redoing it.
    pub fn pending(&self) -> &PendingFrontier<N> {
        &self.pending
    }
}

// ---------------------------------------------------------------------------
// BatchedGraph
// ---------------------------------------------------------------------------

/// A two-level view of a large graph for repeated point-to-point queries.
///
/// Construction greedily covers the node space with [`Batch`]es, pre-solves
/// each cluster's local distances, and condenses the result into a small
/// coarse graph over cluster roots. Queries then search the coarse graph
/// and stitch the answer from pre-solved fine sub-paths instead of
/// searching the full graph — an approximation that trades a bounded
/// amount of path quality for large query-time savings.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound(
        serialize = "N: serde::Serialize + Eq + std::hash::Hash",
        deserialize = "N: serde::Deserialize<'de> + Eq + std::hash::Hash"
    ))
)]
pub struct BatchedGraph<N> {
    start: N,
    batch_radius: f64,
    batch_edge_length: f64,
    batches: Vec<Batch<N>>,
    node_batch: HashMap<N, usize>,
    owned_dist: HashMap<N, f64>,
    // Out-edges per batch: (target batch, minimum observed root-to-root
    // distance).
    coarse: Vec<Vec<(usize, f64)>>,
}

impl<N: Clone + Eq + Hash> BatchedGraph<N> {
    /// Cover the graph reachable from `start` with clusters of radius
    /// `batch_radius`, linked through halos of `batch_edge_length`.
    ///
    /// # Panics
    ///
    /// Panics when `batch_radius <= 0` or
    /// `batch_edge_length < batch_radius`.
    pub fn new<G>(graph: &G, start: N, batch_radius: f64, batch_edge_length: f64) -> Self
    where
        G: HeuristicGraph<Node = N>,
    {
        assert!(batch_radius > 0.0, "batch radius must be positive");
        assert!(
            batch_edge_length >= batch_radius,
            "batch edge length must be at least the batch radius"
        );
        let mut bg = Self {
            start: start.clone(),
            batch_radius,
            batch_edge_length,
            batches: Vec::new(),
            node_batch: HashMap::new(),
            owned_dist: HashMap::new(),
            coarse: Vec::new(),
        };
        bg.build_cover(graph, start);
        bg.build_coarse_edges();
        bg.repair_links(graph);
        debug!(
            "batched graph ready: {} batches over {} owned nodes",
            bg.batches.len(),
            bg.node_batch.len()
        );
        bg
    }

    // Greedy cover. Candidate roots are prioritized by descending
    // reference count (how many built batches reached them) and then by
    // proximity to the most recently built root, so new clusters grow
    // outward along the seams of existing ones.
    fn build_cover<G>(&mut self, graph: &G, start: N)
    where
        G: WeightedGraph<Node = N>,
    {
        let mut candidates: DualKeyedQueue<N> = DualKeyedQueue::new();
        let mut refcount: HashMap<N, u64> = HashMap::new();
        let mut rooted: HashSet<N> = HashSet::new();
        candidates.push(!0u64, key_from_f64(0.0), start);

        let mut ebuf: Vec<(N, f64)> = Vec::new();
        while let Some((_, cand)) = candidates.pop() {
            if rooted.contains(&cand) {
                continue;
            }
            if !self.batches.is_empty() && self.node_batch.contains_key(&cand) {
                ebuf.clear();
                graph.edges(&cand, &mut ebuf);
                if ebuf.iter().all(|(next, _)| self.node_batch.contains_key(next)) {
                    continue; // adds no coverage
                }
            }

            rooted.insert(cand.clone());
            let index = self.batches.len();
            let mut pending = PendingFrontier::seeded(cand.clone());
            let mut map = DistanceMap::new(cand.clone());
            map.resume(graph, None, self.batch_radius, &mut pending);
            trace!("batch {index}: {} nodes within radius", map.distances().len());

            // Claim reached nodes, closest root wins; every reached node
            // becomes a candidate with its bumped reference count.
            for (node, &d) in map.distances() {
                let claim = match self.owned_dist.get(node) {
                    Some(&cur) => d < cur,
                    None => true,
                };
                if claim {
                    self.node_batch.insert(node.clone(), index);
                    self.owned_dist.insert(node.clone(), d);
                }
                let count = refcount.entry(node.clone()).or_insert(0);
                *count += 1;
                candidates.push(!*count, key_from_f64(d), node.clone());
            }

            // Widen to the linking halo; ownership stays as claimed above.
            map.resume(graph, None, self.batch_edge_length, &mut pending);
            self.batches.push(Batch {
                root: cand,
                map,
                pending,
            });
        }
    }

    // One coarse edge per ordered batch pair whose (halo-extended) map
    // reaches the other's root, keeping the minimum observed distance.
    fn build_coarse_edges(&mut self) {
        let n = self.batches.len();
        self.coarse = vec![Vec::new(); n];
        for a in 0..n {
            for b in 0..n {
                if a == b {
                    continue;
                }
                let Some(d) = self.batches[a].map.distance(self.batches[b].root()) else {
                    continue;
                };
                if d > 0.0 {
                    add_coarse_edge(&mut self.coarse[a], b, d);
                }
            }
        }
    }

    // The radius cover can leave a batch with no coarse route back to the
    // start batch even though the underlying graph connects them. Link
    // each such batch to the first already-linked root its own map
    // reaches (first-fit, deliberately not closest-fit), nearest-to-start
    // batches first so early promotions help later ones.
    fn repair_links<G>(&mut self, graph: &G)
    where
        G: HeuristicGraph<Node = N>,
    {
        let n = self.batches.len();
        let Some(&start_batch) = self.node_batch.get(&self.start) else {
            return;
        };

        // Which batches can already reach the start batch, via reversed
        // coarse edges.
        let mut rev: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (a, edges) in self.coarse.iter().enumerate() {
            for &(b, _) in edges {
                rev[b].push(a);
            }
        }
        let mut linked = vec![false; n];
        linked[start_batch] = true;
        let mut stack = vec![start_batch];
        while let Some(b) = stack.pop() {
            for &a in &rev[b] {
                if !linked[a] {
                    linked[a] = true;
                    stack.push(a);
                }
            }
        }

        let mut unlinked: Vec<usize> = (0..n).filter(|&i| !linked[i]).collect();
        unlinked.sort_by_key(|&i| key_from_f64(graph.estimate(&self.start, self.batches[i].root())));
        for bi in unlinked {
            for li in 0..n {
                if !linked[li] || li == bi {
                    continue;
                }
                let Some(d) = self.batches[bi].map.distance(self.batches[li].root()) else {
                    continue;
                };
                if d <= 0.0 {
                    continue;
                }
                add_coarse_edge(&mut self.coarse[bi], li, d);
                linked[bi] = true;
                debug!("repaired link: batch {bi} -> {li}");
                break;
            }
            if !linked[bi] {
                trace!("batch {bi} has no route to a linked batch");
            }
        }
    }

    /// Fix a start node for repeated goal queries. The returned value
    /// amortizes the start's own-batch lookup and a start-rooted local
    /// distance map across every [`StartingPoint::path`] call.
    pub fn starting_point<'a, G>(&'a self, graph: &G, start: N) -> StartingPoint<'a, N>
    where
        G: WeightedGraph<Node = N>,
    {
        let batch = self.node_batch.get(&start).copied();
        let local = DistanceMap::solve(graph, start.clone(), self.batch_edge_length);
        StartingPoint {
            owner: self,
            start,
            batch,
            local,
            coarse: batch.map(AstarSearch::new),
        }
    }

    /// One-shot convenience for [`StartingPoint::path`].
    pub fn path<G>(&self, graph: &G, start: N, goal: &N) -> Vec<N>
    where
        G: HeuristicGraph<Node = N>,
    {
        self.starting_point(graph, start).path(graph, goal)
    }

    /// The clusters of the cover.
    pub fn batches(&self) -> &[Batch<N>] {
        &self.batches
    }

    /// The index of the batch owning `node`, if any batch reached it.
    pub fn batch_of(&self, node: &N) -> Option<usize> {
        self.node_batch.get(node).copied()
    }

    /// Distance from `node` to its owning batch's root.
    pub fn owned_distance(&self, node: &N) -> Option<f64> {
        self.owned_dist.get(node).copied()
    }

    /// Outgoing coarse edges of batch `index`.
    pub fn coarse_edges(&self, index: usize) -> &[(usize, f64)] {
        &self.coarse[index]
    }

    /// The node the cover was grown from.
    pub fn start(&self) -> &N {
        &self.start
    }

    /// The ownership radius of each batch.
    pub fn batch_radius(&self) -> f64 {
        self.batch_radius
    }

    /// The halo radius used to link neighboring batches.
    pub fn batch_edge_length(&self) -> f64 {
        self.batch_edge_length
    }
}

fn add_coarse_edge(edges: &mut Vec<(usize, f64)>, to: usize, d: f64) {
    match edges.iter_mut().find(|(t, _)| *t == to) {
        Some(edge) => {
            if d < edge.1 {
                edge.1 = d;
            }
        }
        None => edges.push((to, d)),
    }
}

// ---------------------------------------------------------------------------
// StartingPoint
// ---------------------------------------------------------------------------

/// A fixed query start against a [`BatchedGraph`].
#[derive(Debug, Clone)]
pub struct StartingPoint<'a, N> {
    owner: &'a BatchedGraph<N>,
    start: N,
    batch: Option<usize>,
    // Start-rooted map bounded by the halo radius; answers nearby goals
    // exactly and provides the first leg of stitched paths.
    local: DistanceMap<N>,
    // Coarse-level search rooted at the start's batch; its memo carries
    // over from goal to goal.
    coarse: Option<AstarSearch<usize>>,
}

impl<N: Clone + Eq + Hash> StartingPoint<'_, N> {
    /// A path from this start to `goal`, both endpoints included.
    ///
    /// Goals within the local map resolve exactly; anything farther goes
    /// through the coarse graph and is stitched from pre-solved cluster
    /// sub-paths, so its total weight may exceed the true shortest
    /// distance. Empty when the goal is unreachable at every level.
    pub fn path<G>(&mut self, graph: &G, goal: &N) -> Vec<N>
    where
        G: HeuristicGraph<Node = N>,
    {
        if self.local.is_settled(goal) {
            return self.local.path(goal);
        }
        let (Some(sb), Some(gb)) = (self.batch, self.owner.batch_of(goal)) else {
            // Off-cover start or goal: fall back to a direct search.
            return AstarSearch::new(self.start.clone()).search_path(graph, goal, f64::INFINITY);
        };

        let route = self.coarse_route(graph, sb, gb);
        if route.is_empty() {
            return Vec::new();
        }
        self.stitch(graph, goal, &route)
    }

    /// The start node.
    pub fn start(&self) -> &N {
        &self.start
    }

    /// The index of the batch owning the start, if any.
    pub fn batch(&self) -> Option<usize> {
        self.batch
    }

    fn coarse_route<G>(&mut self, graph: &G, from: usize, to: usize) -> Vec<usize>
    where
        G: HeuristicGraph<Node = N>,
    {
        if from == to {
            return vec![from];
        }
        let view = CoarseView {
            owner: self.owner,
            graph,
        };
        match self.coarse.as_mut() {
            Some(search) => search.search_path(&view, &to, f64::INFINITY),
            None => Vec::new(),
        }
    }

    fn stitch<G>(&self, graph: &G, goal: &N, route: &[usize]) -> Vec<N>
    where
        G: HeuristicGraph<Node = N>,
    {
        let batches = self.owner.batches();
        let mut path = self.local.path(batches[route[0]].root());
        if path.is_empty() {
            // The local map cannot reach our own root going forward; the
            // hierarchy is no help here.
            return AstarSearch::new(self.start.clone()).search_path(graph, goal, f64::INFINITY);
        }
        for (i, &bi) in route.iter().enumerate() {
            let map = batches[bi].map();
            if map.is_settled(goal) {
                join_path(&mut path, &map.path(goal));
                return path;
            }
            let Some(&next) = route.get(i + 1) else {
                return Vec::new();
            };
            let leg = map.path(batches[next].root());
            if leg.is_empty() {
                return Vec::new();
            }
            join_path(&mut path, &leg);
        }
        Vec::new()
    }
}

// An A*-searchable view of the coarse graph: nodes are batch indices,
// edges the recorded minimum root-to-root distances, estimates deferred
// to the underlying graph's root-to-root heuristic.
struct CoarseView<'a, N, G> {
    owner: &'a BatchedGraph<N>,
    graph: &'a G,
}

impl<N, G> WeightedGraph for CoarseView<'_, N, G>
where
    N: Clone + Eq + Hash,
    G: WeightedGraph<Node = N>,
{
    type Node = usize;

    fn edges(&self, from: &usize, buf: &mut Vec<(usize, f64)>) {
        buf.extend_from_slice(self.owner.coarse_edges(*from));
    }
}

impl<N, G> HeuristicGraph for CoarseView<'_, N, G>
where
    N: Clone + Eq + Hash,
    G: HeuristicGraph<Node = N>,
{
    fn estimate(&self, from: &usize, to: &usize) -> f64 {
        self.graph.estimate(
            self.owner.batches()[*from].root(),
            self.owner.batches()[*to].root(),
        )
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::traits::{HeuristicGraph, WeightedGraph};

    struct Line {
        len: i32,
    }

    impl WeightedGraph for Line {
        type Node = i32;

        fn edges(&self, &from: &i32, buf: &mut Vec<(i32, f64)>) {
            if from > 0 {
                buf.push((from - 1, 1.0));
            }
            if from + 1 < self.len {
                buf.push((from + 1, 1.0));
            }
        }
    }

    impl HeuristicGraph for Line {
        fn estimate(&self, a: &i32, b: &i32) -> f64 {
            (a - b).abs() as f64
        }
    }

    #[test]
    fn batched_graph_round_trip_preserves_query_behavior() {
        let line = Line { len: 24 };
        let bg = BatchedGraph::new(&line, 0, 3.0, 5.0);
        let json = serde_json::to_string(&bg).unwrap();
        let back: BatchedGraph<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.batches().len(), bg.batches().len());
        assert_eq!(back.batch_of(&20), bg.batch_of(&20));
        assert_eq!(back.path(&line, 0, &21), bg.path(&line, 0, &21));
    }
}
