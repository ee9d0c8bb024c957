use std::hash::Hash;

use log::trace;
use strata_core::{DualKeyedQueue, key_from_f64};

use crate::distmap::{DistanceMap, Relaxed};
use crate::frontier::PendingFrontier;
use crate::traits::HeuristicGraph;

/// A resumable, memoized, multi-goal A* search from a fixed start.
///
/// The search owns a [`DistanceMap`] memo and a [`PendingFrontier`]; every
/// query extends both instead of recomputing, so asking for many goals
/// against one start — or re-asking with a larger distance budget — only
/// pays for the expansion not already done. Correct resumption relies on
/// the heuristic being consistent (see [`HeuristicGraph::estimate`]).
#[derive(Debug, Clone)]
pub struct AstarSearch<N> {
    memo: DistanceMap<N>,
    pending: PendingFrontier<N>,
    ebuf: Vec<(N, f64)>,
}

impl<N: Clone + Eq + Hash> AstarSearch<N> {
    /// Create a search rooted at `start`.
    pub fn new(start: N) -> Self {
        Self {
            memo: DistanceMap::new(start.clone()),
            pending: PendingFrontier::seeded(start),
            ebuf: Vec::new(),
        }
    }

    /// The start node.
    pub fn start(&self) -> &N {
        self.memo.start()
    }

    /// The accumulated distance/predecessor memo.
    pub fn memo(&self) -> &DistanceMap<N> {
        &self.memo
    }

    /// The shortest path from start to `goal` within `max_distance`, both
    /// endpoints included. Empty if no such path exists.
    pub fn search_path<G>(&mut self, graph: &G, goal: &N, max_distance: f64) -> Vec<N>
    where
        G: HeuristicGraph<Node = N>,
    {
        let best = self.expand(graph, std::slice::from_ref(goal), max_distance, false);
        if best.is_finite() {
            self.memo.path(goal)
        } else {
            Vec::new()
        }
    }

    /// The shortest path to whichever of `goals` is nearest, within
    /// `max_distance`. Empty if none is reachable within the budget.
    pub fn search_path_to_nearest<G>(&mut self, graph: &G, goals: &[N], max_distance: f64) -> Vec<N>
    where
        G: HeuristicGraph<Node = N>,
    {
        if goals.is_empty() {
            return Vec::new();
        }
        self.expand(graph, goals, max_distance, false);
        let mut nearest = self.nearest_settled(goals, max_distance);

        // A goal that was reached but not settled is still mid-resolution;
        // if it could beat the settled pick, a stale answer is possible.
        // Run the frontier all the way to the budget before trusting it.
        let insufficient = goals.iter().any(|goal| {
            !self.memo.is_settled(goal)
                && match (&nearest, self.memo.distance(goal)) {
                    (Some((_, best)), Some(d)) => d < *best,
                    (None, Some(_)) => true,
                    _ => false,
                }
        });
        if insufficient {
            trace!("nearest-goal pick inconclusive, running a full pass");
            self.expand(graph, &[], max_distance, false);
            nearest = self.nearest_settled(goals, max_distance);
        }

        match nearest {
            Some((goal, _)) => self.memo.path(&goal),
            None => Vec::new(),
        }
    }

    /// Enumerate every minimal-cost path from start to `goal`, writing at
    /// most `limit` paths into `out` and returning the written count.
    ///
    /// Expansion keeps going while the frontier still holds entries of
    /// priority *equal* to the goal's distance — that is what keeps every
    /// equal-cost alternative's predecessor link alive.
    pub fn search_all_paths<G>(
        &mut self,
        graph: &G,
        goal: &N,
        max_distance: f64,
        out: &mut Vec<Vec<N>>,
        limit: usize,
    ) -> usize
    where
        G: HeuristicGraph<Node = N>,
    {
        let best = self.expand(graph, std::slice::from_ref(goal), max_distance, true);
        if !best.is_finite() {
            out.clear();
            return 0;
        }
        self.memo.paths_into(goal, out, limit)
    }

    /// The nearest of `goals` within `max_distance`, or `None`.
    ///
    /// Goals are tried in ascending heuristic order; the scan stops once a
    /// solved goal's true distance is at or below the next candidate's
    /// heuristic lower bound, skipping solves that cannot win.
    pub fn search_nearest<G>(&mut self, graph: &G, goals: &[N], max_distance: f64) -> Option<N>
    where
        G: HeuristicGraph<Node = N>,
    {
        let start = self.memo.start().clone();
        let mut order: Vec<&N> = goals.iter().collect();
        order.sort_by_key(|goal| key_from_f64(graph.estimate(&start, goal)));

        let mut best: Option<(f64, N)> = None;
        for goal in order {
            if let Some((d, _)) = &best
                && *d <= graph.estimate(&start, goal)
            {
                break; // no later candidate can beat a settled distance
            }
            let found = self.expand(graph, std::slice::from_ref(goal), max_distance, false);
            if found.is_finite() && best.as_ref().is_none_or(|(d, _)| found < *d) {
                best = Some((found, goal.clone()));
            }
        }
        best.map(|(_, goal)| goal)
    }

    /// Best-first expansion toward `goals` (an empty slice means a plain
    /// bounded Dijkstra pass with no early exit). Returns the distance of
    /// the nearest settled goal, or infinity.
    fn expand<G>(&mut self, graph: &G, goals: &[N], max_distance: f64, all_paths: bool) -> f64
    where
        G: HeuristicGraph<Node = N>,
    {
        let mut best = f64::INFINITY;
        for goal in goals {
            // A memoized distance beyond this call's budget is not an
            // answer for this call.
            if self.memo.is_settled(goal)
                && let Some(d) = self.memo.distance(goal)
                && d <= max_distance
            {
                best = best.min(d);
            }
        }

        let h_min = |node: &N| -> f64 {
            goals
                .iter()
                .map(|goal| graph.estimate(node, goal))
                .fold(if goals.is_empty() { 0.0 } else { f64::INFINITY }, f64::min)
        };

        // Rebuild the working frontier from wherever the last pass paused,
        // preferring nodes farther along among equal priorities (the
        // secondary key inverts g) to keep tie-breaking Dijkstra-shaped.
        let mut frontier: DualKeyedQueue<(N, f64)> = DualKeyedQueue::new();
        let resumed = self.pending.len();
        for node in self.pending.take() {
            if let Some(g) = self.memo.distance(&node) {
                frontier.push(key_from_f64(g + h_min(&node)), !key_from_f64(g), (node, g));
            }
        }
        if resumed > 1 {
            trace!("resuming expansion from {resumed} suspended nodes");
        }

        let mut ebuf = std::mem::take(&mut self.ebuf);
        loop {
            let stop = match frontier.peek_primary() {
                None => break,
                Some(f_key) => {
                    best.is_finite()
                        && if all_paths {
                            f_key > key_from_f64(best)
                        } else {
                            f_key >= key_from_f64(best)
                        }
                }
            };
            if stop {
                // Everything still queued stays resumable for later calls.
                for (_, (node, _)) in frontier.drain() {
                    self.pending.insert(node);
                }
                break;
            }
            let Some((_, (node, g))) = frontier.pop() else {
                break;
            };
            match self.memo.distance(&node) {
                Some(d) if d == g => {}
                _ => continue, // stale entry
            }
            if g > max_distance {
                self.pending.insert(node);
                continue;
            }
            self.memo.mark_settled(node.clone());
            if goals.contains(&node) {
                best = best.min(g);
            }

            ebuf.clear();
            graph.edges(&node, &mut ebuf);
            for (next, weight) in ebuf.drain(..) {
                assert!(weight > 0.0, "edge weight must be strictly positive");
                let cand = g + weight;
                if cand > max_distance {
                    self.pending.insert(node.clone());
                    continue;
                }
                if let Relaxed::Improved = self.memo.relax(&node, next.clone(), cand) {
                    frontier.push(
                        key_from_f64(cand + h_min(&next)),
                        !key_from_f64(cand),
                        (next, cand),
                    );
                }
            }
        }
        self.ebuf = ebuf;
        best
    }

    fn nearest_settled(&self, goals: &[N], max_distance: f64) -> Option<(N, f64)> {
        let mut best: Option<(N, f64)> = None;
        for goal in goals {
            if !self.memo.is_settled(goal) {
                continue;
            }
            if let Some(d) = self.memo.distance(goal)
                && d <= max_distance
                && best.as_ref().is_none_or(|(_, bd)| d < *bd)
            {
                best = Some((goal.clone(), d));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::WeightedGraph;

    /// A rectangular grid with unit edge weights and Manhattan estimates.
    struct Grid {
        width: i32,
        height: i32,
    }

    impl Grid {
        fn contains(&self, (x, y): (i32, i32)) -> bool {
            x >= 0 && x < self.width && y >= 0 && y < self.height
        }
    }

    impl WeightedGraph for Grid {
        type Node = (i32, i32);

        fn edges(&self, &(x, y): &(i32, i32), buf: &mut Vec<((i32, i32), f64)>) {
            for next in [(x, y - 1), (x + 1, y), (x, y + 1), (x - 1, y)] {
                if self.contains(next) {
                    buf.push((next, 1.0));
                }
            }
        }
    }

    impl HeuristicGraph for Grid {
        fn estimate(&self, a: &(i32, i32), b: &(i32, i32)) -> f64 {
            ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as f64
        }
    }

    fn path_cost(path: &[(i32, i32)]) -> f64 {
        (path.len() as f64 - 1.0).max(0.0)
    }

    #[test]
    fn astar_distances_match_dijkstra() {
        let grid = Grid {
            width: 6,
            height: 5,
        };
        let dijkstra = DistanceMap::solve(&grid, (0, 0), f64::INFINITY);
        let mut astar = AstarSearch::new((0, 0));
        for goal in [(5, 4), (3, 1), (0, 4), (5, 0)] {
            let path = astar.search_path(&grid, &goal, f64::INFINITY);
            assert!(!path.is_empty());
            assert_eq!(astar.memo().distance(&goal), dijkstra.distance(&goal));
            assert_eq!(path_cost(&path), dijkstra.distance(&goal).unwrap());
        }
    }

    #[test]
    fn paths_are_edge_connected_and_endpoint_correct() {
        let grid = Grid {
            width: 7,
            height: 7,
        };
        let mut astar = AstarSearch::new((1, 1));
        let path = astar.search_path(&grid, &(6, 5), f64::INFINITY);
        assert_eq!(path.first(), Some(&(1, 1)));
        assert_eq!(path.last(), Some(&(6, 5)));
        for pair in path.windows(2) {
            let dx = (pair[0].0 - pair[1].0).abs();
            let dy = (pair[0].1 - pair[1].1).abs();
            assert_eq!(dx + dy, 1, "non-adjacent step {pair:?}");
        }
    }

    #[test]
    fn nearest_goal_prefers_the_closer_one() {
        // 10x2 grid; from the origin, (0, 1) at distance 1 must win over
        // (9, 0) at distance 9.
        let grid = Grid {
            width: 10,
            height: 2,
        };
        let mut astar = AstarSearch::new((0, 0));
        let path = astar.search_path_to_nearest(&grid, &[(9, 0), (0, 1)], f64::INFINITY);
        assert_eq!(path, vec![(0, 0), (0, 1)]);

        let mut astar = AstarSearch::new((0, 0));
        let nearest = astar.search_nearest(&grid, &[(9, 0), (0, 1)], f64::INFINITY);
        assert_eq!(nearest, Some((0, 1)));
    }

    #[test]
    fn budgeted_search_resumes_where_it_stopped() {
        let grid = Grid {
            width: 12,
            height: 1,
        };
        let mut astar = AstarSearch::new((0, 0));
        // Budget too small: not found, but progress is kept.
        assert!(astar.search_path(&grid, &(11, 0), 4.0).is_empty());
        // A larger budget finishes the job and matches a fresh search.
        let resumed = astar.search_path(&grid, &(11, 0), f64::INFINITY);
        let fresh = AstarSearch::new((0, 0)).search_path(&grid, &(11, 0), f64::INFINITY);
        assert_eq!(resumed, fresh);
        assert_eq!(path_cost(&resumed), 11.0);
    }

    #[test]
    fn tighter_budget_after_a_memoized_solve_still_binds() {
        let grid = Grid {
            width: 12,
            height: 1,
        };
        let mut astar = AstarSearch::new((0, 0));
        let full = astar.search_path(&grid, &(11, 0), f64::INFINITY);
        assert_eq!(path_cost(&full), 11.0);
        // The goal is now settled in the memo at distance 11; a later
        // budget-4 query must still report not-found, exactly like a
        // fresh budget-4 search would.
        assert!(astar.search_path(&grid, &(11, 0), 4.0).is_empty());
        assert_eq!(astar.search_nearest(&grid, &[(11, 0)], 4.0), None);
        assert!(
            astar
                .search_path_to_nearest(&grid, &[(11, 0)], 4.0)
                .is_empty()
        );
        // The memo keeps what it learned; only the answer is withheld.
        assert_eq!(astar.memo().distance(&(11, 0)), Some(11.0));
        assert_eq!(path_cost(&astar.search_path(&grid, &(11, 0), 11.0)), 11.0);
    }

    #[test]
    fn memo_is_shared_across_goal_queries() {
        let grid = Grid {
            width: 8,
            height: 8,
        };
        let mut astar = AstarSearch::new((0, 0));
        astar.search_path(&grid, &(7, 7), f64::INFINITY);
        // A second goal reuses the memo and still answers exactly.
        let path = astar.search_path(&grid, &(2, 2), f64::INFINITY);
        assert_eq!(path_cost(&path), 4.0);
        let fresh = AstarSearch::new((0, 0)).search_path(&grid, &(2, 2), f64::INFINITY);
        assert_eq!(path_cost(&path), path_cost(&fresh));
        assert_eq!(astar.memo().distance(&(2, 2)), Some(4.0));
    }

    #[test]
    fn all_paths_finds_every_equal_cost_route() {
        let grid = Grid {
            width: 3,
            height: 3,
        };
        let mut astar = AstarSearch::new((0, 0));
        let mut out = Vec::new();
        // Two Manhattan routes to the diagonal neighbor.
        let written = astar.search_all_paths(&grid, &(1, 1), f64::INFINITY, &mut out, 16);
        assert_eq!(written, 2);
        assert!(out.contains(&vec![(0, 0), (1, 0), (1, 1)]));
        assert!(out.contains(&vec![(0, 0), (0, 1), (1, 1)]));
        // Six routes to (2, 1): C(3, 1) choose the order of 2 rights + 1 up.
        let written = astar.search_all_paths(&grid, &(2, 1), f64::INFINITY, &mut out, 16);
        assert_eq!(written, 3);
    }

    #[test]
    fn all_paths_after_a_single_path_query_is_still_complete() {
        let grid = Grid {
            width: 4,
            height: 4,
        };
        let mut astar = AstarSearch::new((0, 0));
        // The single-path query may prune equal-priority frontier entries;
        // the all-paths query must reclaim them from the pending set.
        astar.search_path(&grid, &(1, 1), f64::INFINITY);
        let mut out = Vec::new();
        let written = astar.search_all_paths(&grid, &(1, 1), f64::INFINITY, &mut out, 16);
        assert_eq!(written, 2);
    }

    #[test]
    fn unreachable_goal_reports_not_found() {
        let grid = Grid {
            width: 3,
            height: 3,
        };
        let mut astar = AstarSearch::new((0, 0));
        assert!(astar.search_path(&grid, &(99, 99), f64::INFINITY).is_empty());
        assert_eq!(astar.search_nearest(&grid, &[(99, 99)], f64::INFINITY), None);
        assert!(
            astar
                .search_path_to_nearest(&grid, &[], f64::INFINITY)
                .is_empty()
        );
    }

    #[test]
    fn search_nearest_respects_the_budget() {
        let grid = Grid {
            width: 10,
            height: 1,
        };
        let mut astar = AstarSearch::new((0, 0));
        assert_eq!(astar.search_nearest(&grid, &[(9, 0)], 3.0), None);
        assert_eq!(
            astar.search_nearest(&grid, &[(9, 0)], f64::INFINITY),
            Some((9, 0))
        );
    }
}
