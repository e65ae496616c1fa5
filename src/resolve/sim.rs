//! Reference engine.
//!
//! Applies one action per piece per turn to an owned `Snapshot`:
//!
//! - moves must land on the board within the piece's walk distance;
//! - tanks attack their own tile and conquer it for their country;
//! - artillery fires at a tile within range (no effect on ownership);
//! - builders collect money from tiles their country owns, moving it from
//!   tile to purse, and spend it to spawn a piece with a fresh id on their
//!   tile.
//!
//! Rejected actions leave the snapshot untouched and do not use up the
//! piece's action.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{
    Action, ActionError, ActionSink, Coordinate, Piece, PieceId, PieceKind, Role, Snapshot,
};

pub struct Simulator {
    snapshot: Snapshot,
    prices: BTreeMap<PieceKind, u32>,
    acted: BTreeSet<PieceId>,
    applied: Vec<Action>,
    turn: u32,
    /// Lowest id never handed out; ids of removed pieces are not reused.
    next_id: u32,
}

impl Simulator {
    pub fn new(snapshot: Snapshot, prices: BTreeMap<PieceKind, u32>) -> Self {
        let next_id = snapshot.max_piece_id().map_or(1, |m| m.0 + 1);
        Simulator {
            next_id,
            snapshot,
            prices,
            acted: BTreeSet::new(),
            applied: Vec::new(),
            turn: 0,
        }
    }

    /// The current world state.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Direct access to the world, for scripted events (pieces destroyed,
    /// tiles lost) between turns.
    pub fn snapshot_mut(&mut self) -> &mut Snapshot {
        &mut self.snapshot
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Actions accepted so far this turn, in submission order.
    pub fn applied(&self) -> &[Action] {
        &self.applied
    }

    /// Closes the turn and returns the actions that were applied during it.
    pub fn end_turn(&mut self) -> Vec<Action> {
        self.acted.clear();
        self.turn += 1;
        std::mem::take(&mut self.applied)
    }

    /// Money on every tile plus money carried by builders. Only builds
    /// reduce it.
    pub fn total_money(&self) -> u64 {
        let on_tiles: u64 = self.snapshot.tiles().map(|t| u64::from(t.money)).sum();
        on_tiles + self.snapshot.builders_money()
    }

    fn actor(&self, id: PieceId) -> Result<&Piece, ActionError> {
        if self.acted.contains(&id) {
            return Err(ActionError::AlreadyActed(id));
        }
        self.snapshot
            .piece(id)
            .map_err(|_| ActionError::UnknownPiece(id))
    }

    fn apply_move(&mut self, id: PieceId, to: Coordinate) -> Result<(), ActionError> {
        let piece = self.actor(id)?;
        if !self.snapshot.contains(to) {
            return Err(ActionError::OutOfBounds(to));
        }
        let walk = piece.role.walk();
        if piece.position.distance(to) > walk {
            return Err(ActionError::TooFar {
                piece: id,
                from: piece.position,
                to,
                walk,
            });
        }
        self.piece_mut(id)?.position = to;
        Ok(())
    }

    fn apply_attack(&mut self, id: PieceId, target: Option<Coordinate>) -> Result<(), ActionError> {
        let piece = self.actor(id)?;
        let (position, country, role) = (piece.position, piece.country.clone(), piece.role);
        match role {
            Role::Attacker { .. } => {
                if let Some(t) = target.filter(|t| *t != position) {
                    return Err(ActionError::OutOfRange {
                        piece: id,
                        target: t,
                        range: 0,
                    });
                }
                self.snapshot
                    .set_owner(position, Some(country))
                    .map_err(|_| ActionError::OutOfBounds(position))
            }
            Role::Artillery { range, .. } => {
                let t = target.unwrap_or(position);
                if !self.snapshot.contains(t) {
                    return Err(ActionError::OutOfBounds(t));
                }
                if position.distance(t) > range {
                    return Err(ActionError::OutOfRange {
                        piece: id,
                        target: t,
                        range,
                    });
                }
                Ok(())
            }
            _ => Err(ActionError::CannotAttack(id)),
        }
    }

    fn apply_collect(&mut self, id: PieceId, amount: u32) -> Result<(), ActionError> {
        let piece = self.actor(id)?;
        if !matches!(piece.role, Role::Builder { .. }) {
            return Err(ActionError::NotABuilder(id));
        }
        let at = piece.position;
        let country = piece.country.clone();
        let tile = self
            .snapshot
            .tile_mut(at)
            .map_err(|_| ActionError::OutOfBounds(at))?;
        if !tile.is_owned_by(&country) {
            return Err(ActionError::ForeignTile(at));
        }
        if tile.money < amount {
            return Err(ActionError::TileExhausted {
                at,
                requested: amount,
                available: tile.money,
            });
        }
        tile.money -= amount;
        self.piece_mut(id)?.deposit(amount);
        Ok(())
    }

    fn apply_build(&mut self, id: PieceId, kind: PieceKind) -> Result<(), ActionError> {
        let piece = self.actor(id)?;
        if !matches!(piece.role, Role::Builder { .. }) {
            return Err(ActionError::NotABuilder(id));
        }
        let price = *self.prices.get(&kind).ok_or(ActionError::Unbuildable(kind))?;
        let (at, country, available) = (piece.position, piece.country.clone(), piece.money());
        if available < price {
            return Err(ActionError::InsufficientFunds {
                piece: id,
                needed: price,
                available,
            });
        }
        self.piece_mut(id)?.spend(price);
        let fresh = PieceId(
            self.snapshot
                .max_piece_id()
                .map_or(self.next_id, |m| self.next_id.max(m.0 + 1)),
        );
        self.next_id = fresh.0 + 1;
        self.snapshot
            .add_piece(Piece::new(fresh, kind, country, at))
            .map_err(|_| ActionError::OutOfBounds(at))
    }

    fn piece_mut(&mut self, id: PieceId) -> Result<&mut Piece, ActionError> {
        self.snapshot
            .piece_mut(id)
            .map_err(|_| ActionError::UnknownPiece(id))
    }
}

impl ActionSink for Simulator {
    fn submit(&mut self, action: Action) -> Result<(), ActionError> {
        match action {
            Action::Move { piece, to } => self.apply_move(piece, to)?,
            Action::Attack { piece, target } => self.apply_attack(piece, target)?,
            Action::CollectMoney { piece, amount } => self.apply_collect(piece, amount)?,
            Action::Build { piece, kind } => self.apply_build(piece, kind)?,
        }
        self.acted.insert(action.piece());
        self.applied.push(action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Country;
    use crate::config::default_prices;

    fn home() -> Country {
        Country::new("berzerkistan")
    }

    fn sim() -> Simulator {
        let mut s = Snapshot::new(6, 6, home()).unwrap();
        s.set_owner(Coordinate::new(1, 1), Some(home())).unwrap();
        s.set_money(Coordinate::new(1, 1), 12).unwrap();
        s.set_owner(Coordinate::new(4, 4), Some(Country::new("lichtenstein")))
            .unwrap();
        s.add_piece(Piece::new(PieceId(1), PieceKind::Tank, home(), Coordinate::new(4, 3)))
            .unwrap();
        s.add_piece(Piece::builder(PieceId(2), home(), Coordinate::new(1, 1), 0))
            .unwrap();
        s.add_piece(Piece::new(PieceId(3), PieceKind::Artillery, home(), Coordinate::new(0, 0)))
            .unwrap();
        Simulator::new(s, default_prices())
    }

    fn mv(piece: u32, x: i32, y: i32) -> Action {
        Action::Move {
            piece: PieceId(piece),
            to: Coordinate::new(x, y),
        }
    }

    #[test]
    fn one_action_per_piece_per_turn() {
        let mut sim = sim();
        sim.submit(mv(1, 4, 4)).unwrap();
        assert_eq!(sim.submit(mv(1, 4, 5)), Err(ActionError::AlreadyActed(PieceId(1))));
        let applied = sim.end_turn();
        assert_eq!(applied, vec![mv(1, 4, 4)]);
        assert_eq!(sim.turn(), 1);
        sim.submit(mv(1, 4, 5)).unwrap();
    }

    #[test]
    fn moves_are_bounded() {
        let mut sim = sim();
        assert_eq!(
            sim.submit(mv(3, -1, 0)),
            Err(ActionError::OutOfBounds(Coordinate::new(-1, 0)))
        );
        assert!(matches!(sim.submit(mv(3, 1, 1)), Err(ActionError::TooFar { .. })));
        sim.submit(mv(3, 0, 1)).unwrap();
        assert_eq!(sim.snapshot().piece(PieceId(3)).unwrap().position, Coordinate::new(0, 1));
    }

    #[test]
    fn rejected_action_keeps_the_turn() {
        let mut sim = sim();
        assert!(sim.submit(mv(3, 5, 5)).is_err());
        assert!(sim.applied().is_empty());
        sim.submit(mv(3, 1, 0)).unwrap();
    }

    #[test]
    fn tank_conquers_its_tile() {
        let mut sim = sim();
        sim.submit(mv(1, 4, 4)).unwrap();
        sim.end_turn();
        sim.submit(Action::Attack {
            piece: PieceId(1),
            target: None,
        })
        .unwrap();
        let tile = sim.snapshot().tile(Coordinate::new(4, 4)).unwrap();
        assert!(tile.is_owned_by(&home()));
    }

    #[test]
    fn artillery_range_and_non_attackers() {
        let mut sim = sim();
        assert!(matches!(
            sim.submit(Action::Attack {
                piece: PieceId(3),
                target: Some(Coordinate::new(3, 3))
            }),
            Err(ActionError::OutOfRange { range: 3, .. })
        ));
        sim.submit(Action::Attack {
            piece: PieceId(3),
            target: Some(Coordinate::new(2, 1)),
        })
        .unwrap();
        assert_eq!(
            sim.submit(Action::Attack {
                piece: PieceId(2),
                target: None
            }),
            Err(ActionError::CannotAttack(PieceId(2)))
        );
    }

    #[test]
    fn collecting_moves_money_from_tile_to_purse() {
        let mut sim = sim();
        let before = sim.total_money();
        sim.submit(Action::CollectMoney {
            piece: PieceId(2),
            amount: 5,
        })
        .unwrap();
        assert_eq!(sim.snapshot().piece(PieceId(2)).unwrap().money(), 5);
        assert_eq!(sim.snapshot().tile(Coordinate::new(1, 1)).unwrap().money, 7);
        assert_eq!(sim.total_money(), before);
    }

    #[test]
    fn collecting_is_checked() {
        let mut sim = sim();
        assert!(matches!(
            sim.submit(Action::CollectMoney {
                piece: PieceId(2),
                amount: 13
            }),
            Err(ActionError::TileExhausted { available: 12, .. })
        ));
        assert_eq!(
            sim.submit(Action::CollectMoney {
                piece: PieceId(1),
                amount: 1
            }),
            Err(ActionError::NotABuilder(PieceId(1)))
        );
        sim.submit(mv(2, 2, 1)).unwrap();
        sim.end_turn();
        assert_eq!(
            sim.submit(Action::CollectMoney {
                piece: PieceId(2),
                amount: 1
            }),
            Err(ActionError::ForeignTile(Coordinate::new(2, 1)))
        );
    }

    #[test]
    fn build_spawns_fresh_piece() {
        let mut sim = sim();
        sim.snapshot_mut().piece_mut(PieceId(2)).unwrap().deposit(10);
        sim.submit(Action::Build {
            piece: PieceId(2),
            kind: PieceKind::Tank,
        })
        .unwrap();
        let spawned = sim.snapshot().piece(PieceId(4)).unwrap();
        assert_eq!(spawned.kind(), PieceKind::Tank);
        assert_eq!(spawned.position, Coordinate::new(1, 1));
        assert_eq!(sim.snapshot().piece(PieceId(2)).unwrap().money(), 2);
    }

    #[test]
    fn removed_ids_are_not_handed_out_again() {
        let mut sim = sim();
        sim.snapshot_mut().remove_piece(PieceId(3));
        sim.snapshot_mut().piece_mut(PieceId(2)).unwrap().deposit(16);
        sim.submit(Action::Build {
            piece: PieceId(2),
            kind: PieceKind::Tank,
        })
        .unwrap();
        assert!(!sim.snapshot().has_piece(PieceId(3)));
        assert_eq!(sim.snapshot().piece(PieceId(4)).unwrap().kind(), PieceKind::Tank);

        sim.end_turn();
        sim.submit(Action::Build {
            piece: PieceId(2),
            kind: PieceKind::Tank,
        })
        .unwrap();
        assert!(sim.snapshot().has_piece(PieceId(5)));
    }

    #[test]
    fn build_needs_funds() {
        let mut sim = sim();
        assert_eq!(
            sim.submit(Action::Build {
                piece: PieceId(2),
                kind: PieceKind::Builder
            }),
            Err(ActionError::InsufficientFunds {
                piece: PieceId(2),
                needed: 20,
                available: 0
            })
        );
    }

    #[test]
    fn unknown_piece_is_rejected() {
        let mut sim = sim();
        assert_eq!(sim.submit(mv(9, 0, 0)), Err(ActionError::UnknownPiece(PieceId(9))));
    }
}
