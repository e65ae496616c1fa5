//! Position evaluation.
//!
//! Currently limited to classifying tile ownership; there is no opponent
//! modelling beyond that.

pub mod danger;

pub use danger::{classify, estimate_tile_danger, Danger};
