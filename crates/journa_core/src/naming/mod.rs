//! Slug naming rules shared by store and service layers.
//!
//! # Responsibility
//! - Convert display names to slugs and back (`codec`).
//! - Pick collision-free on-disk names (`collision`).

pub mod codec;
pub mod collision;
