//! Artillery escort: each idle artillery shadows the closest tank.

use std::collections::BTreeMap;

use crate::board::{Coordinate, PieceId, PieceKind, Snapshot};

/// Where one artillery piece should head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escort {
    pub piece: PieceId,
    /// The tank being escorted.
    pub tank: PieceId,
    pub destination: Coordinate,
}

/// Picks an escort destination for every idle artillery piece.
///
/// The nearest tank (ties to the lower id) is chosen among all of the
/// agent's tanks, busy or not. The artillery heads for that tank's attack
/// objective when `objectives` has one, otherwise for the tank itself.
/// With no tanks on the board nothing is returned.
pub fn escort_targets(
    snapshot: &Snapshot,
    idle: &[(PieceId, Coordinate)],
    objectives: &BTreeMap<PieceId, Coordinate>,
) -> Vec<Escort> {
    let tanks: Vec<(PieceId, Coordinate)> = snapshot
        .pieces_of(PieceKind::Tank)
        .map(|p| (p.id, p.position))
        .collect();

    idle.iter()
        .filter_map(|&(piece, at)| {
            let &(tank, position) = tanks
                .iter()
                .min_by_key(|(id, pos)| (pos.distance(at), *id))?;
            let destination = objectives.get(&tank).copied().unwrap_or(position);
            Some(Escort {
                piece,
                tank,
                destination,
            })
        })
        .collect()
}
