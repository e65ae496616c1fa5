//! Money collection for builders.
//!
//! A builder gathering money either picks some up from the owned tile it
//! stands on, or walks one step toward the closest owned tile that still has
//! money and that no other builder has claimed this turn. With no such tile
//! it wanders in a random direction.

use std::cmp::Reverse;

use rand::Rng;

use crate::board::{Coordinate, Piece, Snapshot};
use crate::config::StrategyConfig;

use super::movement::{random_step, step_toward};
use super::{PlanError, TurnLedger};

/// This turn's collection decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collect {
    /// The builder already carries enough (or all it can).
    Done,
    /// Pick up `amount` from the current tile; `done` if that meets the target.
    Gather { amount: u32, done: bool },
    /// Step to `to`, heading for the claimed tile `toward` (`None` when wandering).
    Move {
        to: Coordinate,
        toward: Option<Coordinate>,
    },
    /// Nowhere to go.
    Blocked,
}

/// Decides how `builder` works toward carrying `target` money.
pub fn plan_collection<R: Rng>(
    snapshot: &Snapshot,
    builder: &Piece,
    target: u32,
    config: &StrategyConfig,
    ledger: &mut TurnLedger,
    rng: &mut R,
) -> Result<Collect, PlanError> {
    let carried = builder.money();
    if carried >= target || carried >= config.carry_cap {
        return Ok(Collect::Done);
    }

    let here = snapshot.tile(builder.position)?;
    let available = ledger.remaining(here);
    if here.is_owned_by(&snapshot.my_country) && available > 0 {
        let amount = config
            .collect_cap
            .min(available)
            .min(config.carry_cap - carried);
        ledger.withdraw(here.coordinate, amount);
        return Ok(Collect::Gather {
            amount,
            done: carried + amount >= target,
        });
    }

    let best = snapshot
        .tiles()
        .filter(|t| t.coordinate != builder.position)
        .filter(|t| t.is_owned_by(&snapshot.my_country))
        .filter(|t| !ledger.is_claimed(t.coordinate))
        .map(|t| (t.coordinate, ledger.remaining(t)))
        .filter(|(_, money)| *money > 0)
        .min_by_key(|(c, money)| (c.distance(builder.position), Reverse(*money), *c));

    if let Some((goal, _)) = best {
        ledger.claim(goal);
        if let Some(to) = step_toward(snapshot, builder.position, goal, rng) {
            return Ok(Collect::Move {
                to,
                toward: Some(goal),
            });
        }
    }

    Ok(match random_step(snapshot, builder.position, rng) {
        Some(to) => Collect::Move { to, toward: None },
        None => Collect::Blocked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Country, PieceId};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn home() -> Country {
        Country::new("berzerkistan")
    }

    fn board() -> Snapshot {
        Snapshot::new(10, 10, home()).unwrap()
    }

    fn own(s: &mut Snapshot, x: i32, y: i32, money: u32) {
        s.set_owner(Coordinate::new(x, y), Some(home())).unwrap();
        s.set_money(Coordinate::new(x, y), money).unwrap();
    }

    #[test]
    fn done_when_target_met() {
        let s = board();
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(0, 0), 20);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_collection(&s, &b, 20, &StrategyConfig::default(), &mut ledger, &mut rng);
        assert_eq!(plan, Ok(Collect::Done));
    }

    #[test]
    fn done_at_carry_cap() {
        let s = board();
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(0, 0), 100);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_collection(&s, &b, 500, &StrategyConfig::default(), &mut ledger, &mut rng);
        assert_eq!(plan, Ok(Collect::Done));
    }

    #[test]
    fn gathers_capped_amount() {
        let mut s = board();
        own(&mut s, 3, 3, 12);
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(3, 3), 0);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_collection(&s, &b, 20, &StrategyConfig::default(), &mut ledger, &mut rng);
        assert_eq!(plan, Ok(Collect::Gather { amount: 5, done: false }));
        assert_eq!(ledger.remaining(s.tile(Coordinate::new(3, 3)).unwrap()), 7);
    }

    #[test]
    fn gathers_remaining_balance_and_finishes() {
        let mut s = board();
        own(&mut s, 3, 3, 2);
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(3, 3), 17);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_collection(&s, &b, 19, &StrategyConfig::default(), &mut ledger, &mut rng);
        assert_eq!(plan, Ok(Collect::Gather { amount: 2, done: true }));
    }

    #[test]
    fn gather_respects_carry_cap() {
        let mut s = board();
        own(&mut s, 3, 3, 50);
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(3, 3), 98);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_collection(&s, &b, 200, &StrategyConfig::default(), &mut ledger, &mut rng);
        assert_eq!(plan, Ok(Collect::Gather { amount: 2, done: false }));
    }

    #[test]
    fn foreign_money_is_ignored() {
        let mut s = board();
        s.set_owner(Coordinate::new(3, 3), Some(Country::new("lichtenstein")))
            .unwrap();
        s.set_money(Coordinate::new(3, 3), 40).unwrap();
        own(&mut s, 3, 5, 4);
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(3, 3), 0);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_collection(&s, &b, 20, &StrategyConfig::default(), &mut ledger, &mut rng);
        assert_eq!(
            plan,
            Ok(Collect::Move {
                to: Coordinate::new(3, 4),
                toward: Some(Coordinate::new(3, 5)),
            })
        );
    }

    #[test]
    fn prefers_nearest_then_richest() {
        let mut s = board();
        own(&mut s, 0, 2, 3);
        own(&mut s, 2, 0, 9);
        own(&mut s, 5, 5, 90);
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(0, 0), 0);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_collection(&s, &b, 20, &StrategyConfig::default(), &mut ledger, &mut rng);
        assert_eq!(
            plan,
            Ok(Collect::Move {
                to: Coordinate::new(1, 0),
                toward: Some(Coordinate::new(2, 0)),
            })
        );
        assert!(ledger.is_claimed(Coordinate::new(2, 0)));
    }

    #[test]
    fn claimed_tiles_are_skipped() {
        let mut s = board();
        own(&mut s, 2, 0, 9);
        own(&mut s, 0, 3, 1);
        let first = Piece::builder(PieceId(1), home(), Coordinate::new(0, 0), 0);
        let second = Piece::builder(PieceId(2), home(), Coordinate::new(0, 0), 0);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let config = StrategyConfig::default();

        let a = plan_collection(&s, &first, 20, &config, &mut ledger, &mut rng).unwrap();
        let b = plan_collection(&s, &second, 20, &config, &mut ledger, &mut rng).unwrap();
        assert!(matches!(a, Collect::Move { toward: Some(c), .. } if c == Coordinate::new(2, 0)));
        assert!(matches!(b, Collect::Move { toward: Some(c), .. } if c == Coordinate::new(0, 3)));
    }

    #[test]
    fn two_builders_cannot_overdraw_one_tile() {
        let mut s = board();
        own(&mut s, 4, 4, 7);
        let first = Piece::builder(PieceId(1), home(), Coordinate::new(4, 4), 0);
        let second = Piece::builder(PieceId(2), home(), Coordinate::new(4, 4), 0);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let config = StrategyConfig::default();

        let a = plan_collection(&s, &first, 20, &config, &mut ledger, &mut rng).unwrap();
        let b = plan_collection(&s, &second, 20, &config, &mut ledger, &mut rng).unwrap();
        assert_eq!(a, Collect::Gather { amount: 5, done: false });
        assert_eq!(b, Collect::Gather { amount: 2, done: false });
    }

    #[test]
    fn wanders_when_no_money_anywhere() {
        let s = board();
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(5, 5), 0);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(4);
        let plan = plan_collection(&s, &b, 20, &StrategyConfig::default(), &mut ledger, &mut rng)
            .unwrap();
        match plan {
            Collect::Move { to, toward: None } => {
                assert!(s.contains(to));
                assert_eq!(to.distance(Coordinate::new(5, 5)), 1);
            }
            other => panic!("expected a wander step, got {:?}", other),
        }
    }
}
