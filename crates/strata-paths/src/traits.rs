use std::hash::Hash;

/// Minimal graph capability — weighted outgoing-edge enumeration.
///
/// Nodes are opaque: the engine only clones, compares and hashes them.
pub trait WeightedGraph {
    /// The caller-chosen node type.
    type Node: Clone + Eq + Hash;

    /// Append the outgoing `(neighbor, weight)` pairs of `from` into `buf`.
    /// The caller clears `buf` before calling. Weights must be > 0.
    fn edges(&self, from: &Self::Node, buf: &mut Vec<(Self::Node, f64)>);
}

/// Weighted graph with an admissible heuristic.
pub trait HeuristicGraph: WeightedGraph {
    /// Heuristic estimate of the distance from `from` to `to`.
    ///
    /// Must never overestimate the true cost (admissible). Frontier
    /// resumption additionally relies on the triangle inequality holding
    /// between any two nodes and a goal (consistent).
    fn estimate(&self, from: &Self::Node, to: &Self::Node) -> f64;
}
