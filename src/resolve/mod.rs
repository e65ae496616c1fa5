//! Action resolution.
//!
//! A small in-process game engine that validates the command engine's
//! actions against the rules and applies them to a snapshot. Used by the
//! match runner, the integration tests and the benchmarks.

pub mod sim;

pub use sim::Simulator;
