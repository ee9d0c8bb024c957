//! Incremental shortest-path search over caller-defined weighted graphs.
//!
//! This crate provides a family of search tools that share one theme:
//! work done for an earlier query is kept and extended by later ones.
//!
//! - **Distance maps** — single-source shortest distances with full
//!   predecessor tracking and bounded, resumable solves ([`DistanceMap`],
//!   [`PendingFrontier`])
//! - **A\*** — a memoized, resumable, multi-goal point-to-point search
//!   ([`AstarSearch`])
//! - **Batched graphs** — a precomputed two-level hierarchy that answers
//!   long-range path queries by searching a small coarse graph and
//!   stitching pre-solved cluster sub-paths ([`BatchedGraph`],
//!   [`StartingPoint`])
//!
//! Graphs are supplied by the caller through capability traits; nodes are
//! any `Clone + Eq + Hash` type.
//!
//! # Trait hierarchy
//!
//! | Trait | Required for |
//! |---|---|
//! | [`WeightedGraph`] | distance maps |
//! | [`HeuristicGraph`] : [`WeightedGraph`] | A*, batched graphs |

mod astar;
mod batched;
mod distmap;
mod frontier;
mod joiner;
mod traits;

pub use astar::AstarSearch;
pub use batched::{Batch, BatchedGraph, StartingPoint};
pub use distmap::DistanceMap;
pub use frontier::PendingFrontier;
pub use joiner::join_path;
pub use traits::{HeuristicGraph, WeightedGraph};
