//! Single-step movement planning.
//!
//! Moves a piece one tile per turn toward a destination. The axis to advance
//! on is drawn at random, weighted by the distance still to cover on each
//! axis, which gives roughly diagonal paths instead of an L-shaped
//! staircase. Every step is checked against the board bounds before it is
//! returned.

use rand::Rng;

use crate::board::{Coordinate, Snapshot};
use crate::eval::{classify, Danger};

use super::PlanError;

/// What a piece should do this turn to pursue its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Already within the arrival radius; no move needed.
    Arrived,
    /// Standing on enemy ground: attack in place instead of moving.
    Engage,
    /// Move to this adjacent, on-board tile.
    Move(Coordinate),
    /// The board offers no legal neighbour (1x1 board).
    Blocked,
}

/// Plans one step from `from` toward `destination`.
///
/// `engage` enables the enemy-territory rule for attacking pieces.
pub fn plan_step<R: Rng>(
    snapshot: &Snapshot,
    from: Coordinate,
    destination: Coordinate,
    radius: u32,
    engage: bool,
    rng: &mut R,
) -> Result<Step, PlanError> {
    if from.distance(destination) <= radius {
        return Ok(Step::Arrived);
    }

    if !is_reachable(snapshot, destination, radius) {
        return Err(PlanError::Unreachable {
            destination,
            radius,
        });
    }

    if engage && classify(snapshot.tile(from)?, snapshot) == Danger::Enemy {
        return Ok(Step::Engage);
    }

    Ok(match step_toward(snapshot, from, destination, rng) {
        Some(to) => Step::Move(to),
        None => Step::Blocked,
    })
}

/// Returns true if some board tile lies within `radius` of `destination`.
pub fn is_reachable(snapshot: &Snapshot, destination: Coordinate, radius: u32) -> bool {
    nearest_on_board(snapshot, destination).distance(destination) <= radius
}

/// The on-board tile closest to a possibly off-board coordinate.
fn nearest_on_board(snapshot: &Snapshot, c: Coordinate) -> Coordinate {
    Coordinate::new(c.x.clamp(0, snapshot.width - 1), c.y.clamp(0, snapshot.height - 1))
}

/// Picks the adjacent tile to move to when heading from `from` to `to`.
///
/// The x axis is chosen with probability `|dx| / (|dx| + |dy|)`. If that
/// step would leave the board the other axis is tried, provided it still
/// makes progress; failing both, the piece backs away from the nearest
/// edge. Returns `None` only when `from == to` or the board has no legal
/// neighbour.
pub fn step_toward<R: Rng>(
    snapshot: &Snapshot,
    from: Coordinate,
    to: Coordinate,
    rng: &mut R,
) -> Option<Coordinate> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let (ax, ay) = (dx.unsigned_abs(), dy.unsigned_abs());
    if ax + ay == 0 {
        return None;
    }

    let along_x = rng.gen_range(0..ax + ay) < ax;
    let x_step = from.offset(dx.signum(), 0);
    let y_step = from.offset(0, dy.signum());
    let (first, second, second_progresses) = if along_x {
        (x_step, y_step, ay > 0)
    } else {
        (y_step, x_step, ax > 0)
    };

    if snapshot.contains(first) {
        return Some(first);
    }
    if second_progresses && snapshot.contains(second) {
        return Some(second);
    }
    retreat_from_edge(snapshot, from)
}

/// Steps away from whichever board edge is nearest.
fn retreat_from_edge(snapshot: &Snapshot, from: Coordinate) -> Option<Coordinate> {
    let mut edges = [
        (from.x, from.offset(1, 0)),
        (snapshot.width - 1 - from.x, from.offset(-1, 0)),
        (from.y, from.offset(0, 1)),
        (snapshot.height - 1 - from.y, from.offset(0, -1)),
    ];
    edges.sort_by_key(|(gap, _)| *gap);
    edges
        .iter()
        .map(|(_, step)| *step)
        .find(|step| snapshot.contains(*step))
}

/// A uniformly random on-board neighbour, used when a builder has nowhere
/// better to go.
pub fn random_step<R: Rng>(snapshot: &Snapshot, from: Coordinate, rng: &mut R) -> Option<Coordinate> {
    let legal: Vec<Coordinate> = from
        .neighbours()
        .into_iter()
        .filter(|c| snapshot.contains(*c))
        .collect();
    if legal.is_empty() {
        return None;
    }
    Some(legal[rng.gen_range(0..legal.len())])
}
