use std::collections::HashSet;
use std::hash::Hash;

/// The persisted remainder of a paused search.
///
/// Holds every node whose expansion a distance bound or an early exit cut
/// short. A later solve pass drains the set to rebuild its working
/// frontier, continuing from exactly that boundary instead of redoing
/// prior work. Owning this as an explicit value (rather than hiding it in
/// solver internals) keeps the suspension point inspectable and testable.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound(
        serialize = "N: serde::Serialize + Eq + std::hash::Hash",
        deserialize = "N: serde::Deserialize<'de> + Eq + std::hash::Hash"
    ))
)]
pub struct PendingFrontier<N> {
    nodes: HashSet<N>,
}

impl<N: Clone + Eq + Hash> PendingFrontier<N> {
    /// Create an empty frontier.
    pub fn new() -> Self {
        Self {
            nodes: HashSet::new(),
        }
    }

    /// Create a frontier holding a single node.
    pub fn seeded(node: N) -> Self {
        let mut nodes = HashSet::new();
        nodes.insert(node);
        Self { nodes }
    }

    /// Record a node to resume from. Returns `false` if already present.
    pub fn insert(&mut self, node: N) -> bool {
        self.nodes.insert(node)
    }

    /// Whether `node` is awaiting resumption.
    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    /// Take the whole set, leaving the frontier empty.
    pub fn take(&mut self) -> HashSet<N> {
        std::mem::take(&mut self.nodes)
    }

    /// Number of pending nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop all pending nodes.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<N: Clone + Eq + Hash> Default for PendingFrontier<N> {
    fn default() -> Self {
        Self::new()
    }
}
