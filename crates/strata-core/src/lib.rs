//! Ordering primitives for search frontiers.
//!
//! This crate provides the two building blocks the search crates sit on:
//!
//! - **Order keys** — strictly monotonic conversions from floats and
//!   signed integers to unsigned integers ([`key_from_f64`] and friends),
//!   plus bit-packing accumulators ([`KeyCombine`], [`KeyBuilder`]) for
//!   composite, branch-free sort keys.
//! - **Priority queues** — key-sorted sequences with insert and
//!   remove-minimum, in single-key ([`Queue64`]) and dual-key
//!   ([`DualKeyedQueue`]) shapes.

mod orderkey;
mod queue;

pub use orderkey::{
    Key3, KeyBuilder, KeyCombine, combine, key_from_f32, key_from_f64, key_from_i32, key_from_i64,
};
pub use queue::{DualKeyedQueue, KeyedQueue, Queue64};
