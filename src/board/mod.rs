//! World model for a single turn.
//!
//! Contains coordinates, tiles, pieces, the snapshot the engine hands the
//! agent each turn, and the actions the agent hands back.

pub mod action;
pub mod coord;
pub mod piece;
pub mod snapshot;
pub mod tile;

pub use action::{Action, ActionError, ActionSink};
pub use coord::{distance, Coordinate};
pub use piece::{Piece, PieceId, PieceKind, Role, UnknownPieceKind, ALL_PIECE_KINDS};
pub use snapshot::{Snapshot, SnapshotError};
pub use tile::{Country, Tile};
