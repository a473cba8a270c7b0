//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, sidecar, and session calls into collaborator-level
//!   operations (`workspace`, `move_service`).
//! - Drive debounced autosave for interactive editing (`editor`).

pub mod editor;
pub mod move_service;
pub mod workspace;
