//! Build handling.
//!
//! A builder that can afford the requested piece builds it; otherwise it
//! spends the turn collecting toward the price.

use rand::Rng;

use crate::board::{Piece, PieceKind, Snapshot};
use crate::config::StrategyConfig;

use super::collect::{plan_collection, Collect};
use super::{PlanError, TurnLedger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPlan {
    /// Affordable now: build this turn.
    Build(PieceKind),
    /// Short of money: collect instead.
    Collect(Collect),
}

pub fn plan_build<R: Rng>(
    snapshot: &Snapshot,
    builder: &Piece,
    kind: PieceKind,
    config: &StrategyConfig,
    ledger: &mut TurnLedger,
    rng: &mut R,
) -> Result<BuildPlan, PlanError> {
    let price = config.price(kind).ok_or(PlanError::Unpriced(kind))?;
    if builder.money() >= price {
        return Ok(BuildPlan::Build(kind));
    }
    let collect = plan_collection(snapshot, builder, price, config, ledger, rng)?;
    Ok(BuildPlan::Collect(collect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Coordinate, Country, PieceId};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn home() -> Country {
        Country::new("berzerkistan")
    }

    #[test]
    fn builds_when_affordable() {
        let s = Snapshot::new(5, 5, home()).unwrap();
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(0, 0), 20);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_build(
            &s,
            &b,
            PieceKind::Builder,
            &StrategyConfig::default(),
            &mut ledger,
            &mut rng,
        );
        assert_eq!(plan, Ok(BuildPlan::Build(PieceKind::Builder)));
    }

    #[test]
    fn collects_when_short() {
        let mut s = Snapshot::new(5, 5, home()).unwrap();
        s.set_owner(Coordinate::new(0, 0), Some(home())).unwrap();
        s.set_money(Coordinate::new(0, 0), 12).unwrap();
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(0, 0), 0);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_build(
            &s,
            &b,
            PieceKind::Builder,
            &StrategyConfig::default(),
            &mut ledger,
            &mut rng,
        );
        assert_eq!(
            plan,
            Ok(BuildPlan::Collect(Collect::Gather {
                amount: 5,
                done: false
            }))
        );
    }

    #[test]
    fn unpriced_kind_is_an_error() {
        let s = Snapshot::new(5, 5, home()).unwrap();
        let b = Piece::builder(PieceId(1), home(), Coordinate::new(0, 0), 99);
        let mut config = StrategyConfig::default();
        config.prices.remove(&PieceKind::Spy);
        let mut ledger = TurnLedger::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let plan = plan_build(&s, &b, PieceKind::Spy, &config, &mut ledger, &mut rng);
        assert_eq!(plan, Err(PlanError::Unpriced(PieceKind::Spy)));
    }
}
