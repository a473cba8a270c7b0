//! Domain model for the Trunk > Journal > Note hierarchy.
//!
//! # Responsibility
//! - Define the read model projected from the directory tree.
//! - Define slug references and per-note font metadata.
//!
//! # Invariants
//! - The directory tree on disk is the only source of truth; model values
//!   are snapshots.

pub mod node;
