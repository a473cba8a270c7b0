//! Filesystem persistence layer.
//!
//! # Responsibility
//! - Map the Trunk/Journal/Note hierarchy onto directories (`hierarchy_repo`).
//! - Persist per-note font metadata sidecars (`sidecar`).
//!
//! # Invariants
//! - Disk is the sole source of truth; repository types hold only the root.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`,
//!   `Protected`) in addition to raw I/O failures.

pub mod fs_util;
pub mod hierarchy_repo;
pub mod sidecar;
