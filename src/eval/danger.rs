//! Tile threat classification.
//!
//! Labels a tile as owned, neutral, or enemy from the agent's point of view.
//! The numeric values (0, 1, 2) are part of the external interface.

use serde::{Deserialize, Serialize};

use crate::board::{Coordinate, Snapshot, SnapshotError, Tile};

/// Threat level of a tile relative to the agent's country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Danger {
    Owned = 0,
    Neutral = 1,
    Enemy = 2,
}

impl Danger {
    pub const fn level(self) -> u8 {
        self as u8
    }
}

/// Classifies a tile we already hold a reference to.
pub fn classify(tile: &Tile, snapshot: &Snapshot) -> Danger {
    match &tile.country {
        Some(c) if *c == snapshot.my_country => Danger::Owned,
        None => Danger::Neutral,
        Some(_) => Danger::Enemy,
    }
}

/// Classifies the tile at a coordinate. Fails only for off-board coordinates.
pub fn estimate_tile_danger(snapshot: &Snapshot, at: Coordinate) -> Result<Danger, SnapshotError> {
    let tile = snapshot.tile(at)?;
    Ok(classify(tile, snapshot))
}
