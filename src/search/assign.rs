//! Greedy target assignment for idle tanks.
//!
//! Every enemy and neutral tile is a candidate objective. Enemy tiles always
//! come before neutral ones; within each group tiles are shuffled and then
//! stably sorted by distance to the nearest idle tank, so equally close
//! tiles keep their shuffled order. Walking that list, each tile takes the
//! closest still-unassigned tanks, up to a squad size that depends on
//! whether the tile is enemy or neutral.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Coordinate, PieceId, Snapshot};
use crate::config::StrategyConfig;
use crate::eval::{classify, Danger};

/// One tank sent at one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub piece: PieceId,
    pub target: Coordinate,
    pub danger: Danger,
}

/// Enemy tiles (shuffled) followed by neutral tiles (shuffled).
pub fn candidate_targets<R: Rng>(snapshot: &Snapshot, rng: &mut R) -> Vec<(Coordinate, Danger)> {
    let mut enemy = Vec::new();
    let mut neutral = Vec::new();
    for tile in snapshot.tiles() {
        match classify(tile, snapshot) {
            Danger::Enemy => enemy.push((tile.coordinate, Danger::Enemy)),
            Danger::Neutral => neutral.push((tile.coordinate, Danger::Neutral)),
            Danger::Owned => {}
        }
    }
    enemy.shuffle(rng);
    neutral.shuffle(rng);
    enemy.extend(neutral);
    enemy
}

/// Pairs idle tanks with objective tiles.
///
/// `idle` holds (piece, position) pairs; order does not matter, ties between
/// equally close tanks go to the lower id. No tank appears twice in the
/// result.
pub fn assign_targets<R: Rng>(
    snapshot: &Snapshot,
    idle: &[(PieceId, Coordinate)],
    config: &StrategyConfig,
    rng: &mut R,
) -> Vec<Assignment> {
    if idle.is_empty() {
        return Vec::new();
    }

    let mut pool: Vec<(PieceId, Coordinate)> = idle.to_vec();
    pool.sort_by_key(|(id, _)| *id);
    pool.dedup_by_key(|(id, _)| *id);

    let mut targets = candidate_targets(snapshot, rng);
    targets.sort_by_key(|(c, danger)| {
        let nearest = pool.iter().map(|(_, p)| p.distance(*c)).min().unwrap_or(u32::MAX);
        (danger_rank(*danger), nearest)
    });

    let mut assignments = Vec::new();
    for (target, danger) in targets {
        if pool.is_empty() {
            break;
        }
        let squad = match danger {
            Danger::Enemy => config.enemy_squad_size,
            _ => config.neutral_squad_size,
        };
        for piece in take_closest(&mut pool, target, squad) {
            assignments.push(Assignment {
                piece,
                target,
                danger,
            });
        }
    }
    assignments
}

/// Enemy tiles rank ahead of neutral ones.
fn danger_rank(danger: Danger) -> u8 {
    match danger {
        Danger::Enemy => 0,
        Danger::Neutral => 1,
        Danger::Owned => 2,
    }
}

/// Removes and returns up to `cap` pieces tied for the minimum distance to
/// `target`. `pool` is kept in id order, so ties resolve to lower ids.
fn take_closest(pool: &mut Vec<(PieceId, Coordinate)>, target: Coordinate, cap: usize) -> Vec<PieceId> {
    let Some(best) = pool.iter().map(|(_, p)| p.distance(target)).min() else {
        return Vec::new();
    };
    let mut chosen = Vec::new();
    pool.retain(|(id, p)| {
        if chosen.len() < cap && p.distance(target) == best {
            chosen.push(*id);
            false
        } else {
            true
        }
    });
    chosen
}
