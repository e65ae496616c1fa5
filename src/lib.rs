//! marshal: command lifecycle and execution engine for a turn-based grid
//! conflict agent.
//!
//! Exposes the world model, the command registry, the planners and the turn
//! orchestrator, plus a reference game engine and a match runner used by the
//! binary, the integration tests and the benchmarks.

pub mod board;
pub mod command;
pub mod config;
pub mod engine;
pub mod eval;
pub mod movegen;
pub mod resolve;
pub mod search;
pub mod selfplay;
