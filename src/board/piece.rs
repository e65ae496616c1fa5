//! Piece kinds, roles, and their capabilities.
//!
//! A piece's role is a closed variant over the parts the command engine
//! cares about (attackers, artillery, builders) with everything else folded
//! into `Role::Other`. Each role carries its own capability data, so callers
//! match on the role instead of comparing type names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::coord::Coordinate;
use super::tile::Country;

/// Stable piece identifier, unique within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceId(pub u32);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every piece type the game knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Tank,
    Artillery,
    Builder,
    Airplane,
    Helicopter,
    Antitank,
    IronDome,
    Bunker,
    Spy,
    Tower,
    Satellite,
}

pub const ALL_PIECE_KINDS: [PieceKind; 11] = [
    PieceKind::Tank,
    PieceKind::Artillery,
    PieceKind::Builder,
    PieceKind::Airplane,
    PieceKind::Helicopter,
    PieceKind::Antitank,
    PieceKind::IronDome,
    PieceKind::Bunker,
    PieceKind::Spy,
    PieceKind::Tower,
    PieceKind::Satellite,
];

impl PieceKind {
    /// Returns the lower-case name the game uses for this kind.
    pub const fn name(self) -> &'static str {
        match self {
            PieceKind::Tank => "tank",
            PieceKind::Artillery => "artillery",
            PieceKind::Builder => "builder",
            PieceKind::Airplane => "airplane",
            PieceKind::Helicopter => "helicopter",
            PieceKind::Antitank => "antitank",
            PieceKind::IronDome => "irondome",
            PieceKind::Bunker => "bunker",
            PieceKind::Spy => "spy",
            PieceKind::Tower => "tower",
            PieceKind::Satellite => "satellite",
        }
    }

    /// Parses a kind from its game name.
    pub fn from_name(name: &str) -> Option<PieceKind> {
        ALL_PIECE_KINDS.iter().copied().find(|k| k.name() == name)
    }

    /// Tiles the piece may cross in one move.
    pub const fn walk_distance(self) -> u32 {
        match self {
            PieceKind::Airplane => 8,
            PieceKind::Helicopter => 5,
            _ => 1,
        }
    }

    /// Attack range for pieces that can attack, `None` otherwise.
    pub const fn attack_range(self) -> Option<u32> {
        match self {
            PieceKind::Tank => Some(0),
            PieceKind::Artillery => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown piece type: '{0}'")]
pub struct UnknownPieceKind(pub String);

impl FromStr for PieceKind {
    type Err = UnknownPieceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PieceKind::from_name(s).ok_or_else(|| UnknownPieceKind(s.to_string()))
    }
}

/// What a piece does for the command engine, with its capability data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Tanks: walk to a tile and attack in place.
    Attacker { walk: u32 },
    /// Artillery: escorts attackers, fires at range.
    Artillery { walk: u32, range: u32 },
    /// Builders: carry money and spawn new pieces.
    Builder { walk: u32, money: u32 },
    /// Anything the command engine does not drive.
    Other { kind: PieceKind, walk: u32 },
}

impl Role {
    /// Returns the default role for a freshly spawned piece of the given kind.
    pub fn for_kind(kind: PieceKind) -> Role {
        let walk = kind.walk_distance();
        match kind {
            PieceKind::Tank => Role::Attacker { walk },
            PieceKind::Artillery => Role::Artillery {
                walk,
                range: kind.attack_range().unwrap_or(0),
            },
            PieceKind::Builder => Role::Builder { walk, money: 0 },
            other => Role::Other { kind: other, walk },
        }
    }

    pub const fn kind(&self) -> PieceKind {
        match self {
            Role::Attacker { .. } => PieceKind::Tank,
            Role::Artillery { .. } => PieceKind::Artillery,
            Role::Builder { .. } => PieceKind::Builder,
            Role::Other { kind, .. } => *kind,
        }
    }

    pub const fn walk(&self) -> u32 {
        match self {
            Role::Attacker { walk }
            | Role::Artillery { walk, .. }
            | Role::Builder { walk, .. }
            | Role::Other { walk, .. } => *walk,
        }
    }
}

/// A piece owned by some country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PieceRecord", into = "PieceRecord")]
pub struct Piece {
    pub id: PieceId,
    pub country: Country,
    pub position: Coordinate,
    pub role: Role,
}

impl Piece {
    /// Creates a piece with the default capabilities of its kind.
    pub fn new(id: PieceId, kind: PieceKind, country: Country, position: Coordinate) -> Self {
        Piece {
            id,
            country,
            position,
            role: Role::for_kind(kind),
        }
    }

    /// Creates a builder carrying the given amount of money.
    pub fn builder(id: PieceId, country: Country, position: Coordinate, money: u32) -> Self {
        Piece {
            id,
            country,
            position,
            role: Role::Builder {
                walk: PieceKind::Builder.walk_distance(),
                money,
            },
        }
    }

    pub const fn kind(&self) -> PieceKind {
        self.role.kind()
    }

    /// Money carried. Always zero for non-builders.
    pub const fn money(&self) -> u32 {
        match self.role {
            Role::Builder { money, .. } => money,
            _ => 0,
        }
    }

    /// Adds money to a builder's purse. Returns false for non-builders.
    pub fn deposit(&mut self, amount: u32) -> bool {
        match &mut self.role {
            Role::Builder { money, .. } => {
                *money += amount;
                true
            }
            _ => false,
        }
    }

    /// Takes money from a builder's purse. Returns false if the piece is not
    /// a builder or cannot afford it; the purse is untouched in that case.
    pub fn spend(&mut self, amount: u32) -> bool {
        match &mut self.role {
            Role::Builder { money, .. } if *money >= amount => {
                *money -= amount;
                true
            }
            _ => false,
        }
    }
}

/// Flat on-disk form of a piece, as written in scenario files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PieceRecord {
    id: PieceId,
    kind: PieceKind,
    country: Country,
    position: Coordinate,
    #[serde(default, skip_serializing_if = "is_zero")]
    money: u32,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl From<PieceRecord> for Piece {
    fn from(r: PieceRecord) -> Self {
        let mut piece = Piece::new(r.id, r.kind, r.country, r.position);
        piece.deposit(r.money);
        piece
    }
}

impl From<Piece> for PieceRecord {
    fn from(p: Piece) -> Self {
        PieceRecord {
            id: p.id,
            kind: p.kind(),
            money: p.money(),
            country: p.country,
            position: p.position,
        }
    }
}
