//! Reachability analysis over the content-addressed object graph.
//!
//! A collection cycle needs to know which objects are reachable from which
//! kind of root. This crate provides the [`ObjectGraph`] abstraction, a
//! pack-backed implementation ([`DatabaseGraph`]), a lazy [`Walk`] iterator,
//! and [`reachable_sets`], which computes the primary and secondary closures
//! with primary taking precedence.

pub mod error;
pub mod graph;
pub mod walk;

pub use error::{WalkError, WalkResult};
pub use graph::{DatabaseGraph, ObjectGraph};
pub use walk::{reachable_sets, ReachableSets, Walk};
