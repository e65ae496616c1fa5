//! Per-turn action planning.
//!
//! Turns a piece's standing intent into the one action it takes this turn:
//! a single step toward a destination, an on-tile money pickup, or a build.
//! Planners read the snapshot, consult the per-turn `TurnLedger`, and never
//! touch the command registry.

pub mod build;
pub mod collect;
pub mod movement;

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{Coordinate, PieceId, PieceKind, SnapshotError, Tile};

pub use build::{plan_build, BuildPlan};
pub use collect::{plan_collection, Collect};
pub use movement::{plan_step, random_step, step_toward, Step};

/// Errors a planner can hit while working out a piece's action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("no board tile lies within {radius} of {destination}")]
    Unreachable { destination: Coordinate, radius: u32 },

    #[error("piece type {0} has no price")]
    Unpriced(PieceKind),
}

/// Bookkeeping that lives for exactly one turn.
///
/// Tracks tiles builders have claimed as collection targets, money already
/// drawn from each tile, and which pieces have used their action.
#[derive(Debug, Clone, Default)]
pub struct TurnLedger {
    claimed: BTreeSet<Coordinate>,
    withdrawn: BTreeMap<Coordinate, u32>,
    acted: BTreeSet<PieceId>,
}

impl TurnLedger {
    pub fn new() -> Self {
        TurnLedger::default()
    }

    /// Forgets everything; called at the start of every turn.
    pub fn clear(&mut self) {
        self.claimed.clear();
        self.withdrawn.clear();
        self.acted.clear();
    }

    /// Claims a tile for one builder. Returns false if already claimed.
    pub fn claim(&mut self, at: Coordinate) -> bool {
        self.claimed.insert(at)
    }

    pub fn is_claimed(&self, at: Coordinate) -> bool {
        self.claimed.contains(&at)
    }

    /// Records money drawn from a tile this turn.
    pub fn withdraw(&mut self, at: Coordinate, amount: u32) {
        *self.withdrawn.entry(at).or_insert(0) += amount;
    }

    /// Money still on the tile once this turn's pickups are accounted for.
    pub fn remaining(&self, tile: &Tile) -> u32 {
        let drawn = self.withdrawn.get(&tile.coordinate).copied().unwrap_or(0);
        tile.money.saturating_sub(drawn)
    }

    /// Marks a piece as having used its action. Returns false if it already had.
    pub fn mark_acted(&mut self, piece: PieceId) -> bool {
        self.acted.insert(piece)
    }

    pub fn has_acted(&self, piece: PieceId) -> bool {
        self.acted.contains(&piece)
    }
}
