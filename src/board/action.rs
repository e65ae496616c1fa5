//! Per-turn actions and the sink that carries them to the game engine.
//!
//! Each piece may perform at most one action per turn. The command engine
//! never mutates world state itself: it hands actions to an `ActionSink`,
//! which is the game engine's capability surface (move, attack, collect,
//! build).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::coord::Coordinate;
use super::piece::{PieceId, PieceKind};

/// A single action for one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Step to a tile within the piece's walk distance.
    Move { piece: PieceId, to: Coordinate },

    /// Attack. `target` is `None` for pieces that attack their own tile
    /// (tanks) and a coordinate for ranged pieces (artillery).
    Attack {
        piece: PieceId,
        target: Option<Coordinate>,
    },

    /// Pick up money from the tile the builder stands on.
    CollectMoney { piece: PieceId, amount: u32 },

    /// Spend the builder's money to spawn a new piece on its tile.
    Build { piece: PieceId, kind: PieceKind },
}

impl Action {
    /// The piece performing the action.
    pub const fn piece(&self) -> PieceId {
        match self {
            Action::Move { piece, .. }
            | Action::Attack { piece, .. }
            | Action::CollectMoney { piece, .. }
            | Action::Build { piece, .. } => *piece,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { piece, to } => write!(f, "{} move {}", piece, to),
            Action::Attack { piece, target: None } => write!(f, "{} attack", piece),
            Action::Attack {
                piece,
                target: Some(t),
            } => write!(f, "{} attack {}", piece, t),
            Action::CollectMoney { piece, amount } => write!(f, "{} collect {}", piece, amount),
            Action::Build { piece, kind } => write!(f, "{} build {}", piece, kind),
        }
    }
}

/// Reasons the engine refuses an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("piece {0} does not exist")]
    UnknownPiece(PieceId),

    #[error("piece {0} already acted this turn")]
    AlreadyActed(PieceId),

    #[error("destination {0} is outside the board")]
    OutOfBounds(Coordinate),

    #[error("piece {piece} cannot reach {to} from {from} (walk {walk})")]
    TooFar {
        piece: PieceId,
        from: Coordinate,
        to: Coordinate,
        walk: u32,
    },

    #[error("piece {0} cannot attack")]
    CannotAttack(PieceId),

    #[error("target {target} is out of range {range} for piece {piece}")]
    OutOfRange {
        piece: PieceId,
        target: Coordinate,
        range: u32,
    },

    #[error("piece {0} is not a builder")]
    NotABuilder(PieceId),

    #[error("tile {0} does not belong to the builder's country")]
    ForeignTile(Coordinate),

    #[error("tile {at} holds {available}, cannot collect {requested}")]
    TileExhausted {
        at: Coordinate,
        requested: u32,
        available: u32,
    },

    #[error("builder {piece} has {available}, needs {needed}")]
    InsufficientFunds {
        piece: PieceId,
        needed: u32,
        available: u32,
    },

    #[error("piece type {0} cannot be built")]
    Unbuildable(PieceKind),
}

/// The game engine's capability primitives.
pub trait ActionSink {
    /// Hands one action to the engine. The engine validates legality.
    fn submit(&mut self, action: Action) -> Result<(), ActionError>;
}

/// Records actions without validating them.
impl ActionSink for Vec<Action> {
    fn submit(&mut self, action: Action) -> Result<(), ActionError> {
        self.push(action);
        Ok(())
    }
}
