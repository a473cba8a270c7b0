//! Editing session state and autosave scheduling.
//!
//! # Responsibility
//! - Track the open note, its in-memory status, and the live buffer.
//! - Own the debounced autosave timer contract.
//!
//! # Invariants
//! - Exactly one session is active per `Workspace`.

pub mod autosave;
pub mod state;
