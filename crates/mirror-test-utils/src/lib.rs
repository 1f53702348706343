//! Shared test utilities for the mirror workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixture`] : [`TreeFixture`](fixture::TreeFixture) builder for source/replica setups
//! - [`snapshot`] : whole-tree snapshots for convergence assertions

pub mod fixture;
pub mod snapshot;

pub use fixture::TreeFixture;
pub use snapshot::{Node, assert_trees_match, snapshot_tree};
