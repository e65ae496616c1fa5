//! World snapshot for a single turn.
//!
//! Holds the board dimensions, every tile with its owner and money, and the
//! agent's own pieces. Tiles live in a row-major `Vec` indexed by
//! `y * width + x` so lookups are O(1); pieces live in a `BTreeMap` so
//! iteration order is stable across runs with the same seed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::coord::Coordinate;
use super::piece::{Piece, PieceId, PieceKind};
use super::tile::{Country, Tile};

/// Errors raised by snapshot lookups and construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("coordinate {0} is outside the board")]
    OutOfBounds(Coordinate),

    #[error("no piece with id {0}")]
    UnknownPiece(PieceId),

    #[error("duplicate piece id {0}")]
    DuplicatePiece(PieceId),

    #[error("duplicate tile entry at {0}")]
    DuplicateTile(Coordinate),

    #[error("invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
}

/// Complete view of the world for the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRecord", into = "SnapshotRecord")]
pub struct Snapshot {
    pub width: i32,
    pub height: i32,
    pub my_country: Country,
    tiles: Vec<Tile>,
    my_pieces: BTreeMap<PieceId, Piece>,
}

impl Snapshot {
    /// Creates a board of neutral, empty tiles.
    pub fn new(width: i32, height: i32, my_country: Country) -> Result<Self, SnapshotError> {
        let area = match width.checked_mul(height) {
            Some(area) if width > 0 && height > 0 => area,
            _ => return Err(SnapshotError::InvalidDimensions { width, height }),
        };
        let mut tiles = Vec::with_capacity(area as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::neutral(Coordinate::new(x, y)));
            }
        }
        Ok(Snapshot {
            width,
            height,
            my_country,
            tiles,
            my_pieces: BTreeMap::new(),
        })
    }

    /// Returns true if the coordinate lies on the board.
    pub fn contains(&self, c: Coordinate) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.width && c.y < self.height
    }

    fn index(&self, c: Coordinate) -> Result<usize, SnapshotError> {
        if !self.contains(c) {
            return Err(SnapshotError::OutOfBounds(c));
        }
        Ok((c.y * self.width + c.x) as usize)
    }

    pub fn tile(&self, c: Coordinate) -> Result<&Tile, SnapshotError> {
        let idx = self.index(c)?;
        Ok(&self.tiles[idx])
    }

    pub fn tile_mut(&mut self, c: Coordinate) -> Result<&mut Tile, SnapshotError> {
        let idx = self.index(c)?;
        Ok(&mut self.tiles[idx])
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn set_owner(&mut self, c: Coordinate, owner: Option<Country>) -> Result<(), SnapshotError> {
        self.tile_mut(c)?.country = owner;
        Ok(())
    }

    pub fn set_money(&mut self, c: Coordinate, money: u32) -> Result<(), SnapshotError> {
        self.tile_mut(c)?.money = money;
        Ok(())
    }

    /// Adds one of the agent's pieces. Rejects duplicate ids and off-board positions.
    pub fn add_piece(&mut self, piece: Piece) -> Result<(), SnapshotError> {
        if !self.contains(piece.position) {
            return Err(SnapshotError::OutOfBounds(piece.position));
        }
        if self.my_pieces.contains_key(&piece.id) {
            return Err(SnapshotError::DuplicatePiece(piece.id));
        }
        self.my_pieces.insert(piece.id, piece);
        Ok(())
    }

    pub fn remove_piece(&mut self, id: PieceId) -> Option<Piece> {
        self.my_pieces.remove(&id)
    }

    pub fn piece(&self, id: PieceId) -> Result<&Piece, SnapshotError> {
        self.my_pieces.get(&id).ok_or(SnapshotError::UnknownPiece(id))
    }

    pub fn piece_mut(&mut self, id: PieceId) -> Result<&mut Piece, SnapshotError> {
        self.my_pieces
            .get_mut(&id)
            .ok_or(SnapshotError::UnknownPiece(id))
    }

    pub fn has_piece(&self, id: PieceId) -> bool {
        self.my_pieces.contains_key(&id)
    }

    /// The agent's pieces in id order.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.my_pieces.values()
    }

    /// The agent's pieces of one kind, in id order.
    pub fn pieces_of(&self, kind: PieceKind) -> impl Iterator<Item = &Piece> {
        self.my_pieces.values().filter(move |p| p.kind() == kind)
    }

    /// Highest piece id in use, if any.
    pub fn max_piece_id(&self) -> Option<PieceId> {
        self.my_pieces.keys().next_back().copied()
    }

    /// Total money lying on tiles the agent owns.
    pub fn country_money(&self) -> u64 {
        self.tiles
            .iter()
            .filter(|t| t.is_owned_by(&self.my_country))
            .map(|t| u64::from(t.money))
            .sum()
    }

    /// Total money carried by the agent's builders.
    pub fn builders_money(&self) -> u64 {
        self.pieces_of(PieceKind::Builder)
            .map(|p| u64::from(p.money()))
            .sum()
    }

    /// Every country that owns at least one tile.
    pub fn countries(&self) -> BTreeSet<Country> {
        self.tiles.iter().filter_map(|t| t.country.clone()).collect()
    }

    /// Number of tiles owned by the given country.
    pub fn tiles_owned_by(&self, country: &Country) -> usize {
        self.tiles.iter().filter(|t| t.is_owned_by(country)).count()
    }
}

/// Sparse on-disk form of a snapshot: only tiles with an owner or money are
/// listed; all others are neutral and empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotRecord {
    width: i32,
    height: i32,
    my_country: Country,
    #[serde(default)]
    tiles: Vec<Tile>,
    #[serde(default)]
    pieces: Vec<Piece>,
}

impl TryFrom<SnapshotRecord> for Snapshot {
    type Error = SnapshotError;

    fn try_from(r: SnapshotRecord) -> Result<Self, Self::Error> {
        let mut snapshot = Snapshot::new(r.width, r.height, r.my_country)?;
        let mut seen = BTreeSet::new();
        for tile in r.tiles {
            if !seen.insert(tile.coordinate) {
                return Err(SnapshotError::DuplicateTile(tile.coordinate));
            }
            let at = tile.coordinate;
            *snapshot.tile_mut(at)? = tile;
        }
        for piece in r.pieces {
            snapshot.add_piece(piece)?;
        }
        Ok(snapshot)
    }
}

impl From<Snapshot> for SnapshotRecord {
    fn from(s: Snapshot) -> Self {
        SnapshotRecord {
            width: s.width,
            height: s.height,
            my_country: s.my_country,
            tiles: s
                .tiles
                .into_iter()
                .filter(|t| t.country.is_some() || t.money > 0)
                .collect(),
            pieces: s.my_pieces.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> Country {
        Country::new("berzerkistan")
    }

    #[test]
    fn new_board_is_neutral() {
        let s = Snapshot::new(4, 3, home()).unwrap();
        assert_eq!(s.tiles().count(), 12);
        assert!(s.tiles().all(|t| t.country.is_none() && t.money == 0));
        assert_eq!(s.tile(Coordinate::new(3, 2)).unwrap().coordinate, Coordinate::new(3, 2));
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert_eq!(
            Snapshot::new(0, 5, home()),
            Err(SnapshotError::InvalidDimensions { width: 0, height: 5 })
        );
    }

    #[test]
    fn oversized_board_is_rejected() {
        assert_eq!(
            Snapshot::new(70000, 70000, home()),
            Err(SnapshotError::InvalidDimensions {
                width: 70000,
                height: 70000
            })
        );
        let json = r#"{"width":70000,"height":70000,"my_country":"berzerkistan"}"#;
        assert!(serde_json::from_str::<Snapshot>(json).is_err());
    }

    #[test]
    fn json_tile_entries_land_on_their_coordinate() {
        let json = r#"{
            "width": 3, "height": 3, "my_country": "berzerkistan",
            "tiles": [{"coordinate": {"x": 2, "y": 1}, "country": "berzerkistan", "money": 7}]
        }"#;
        let s: Snapshot = serde_json::from_str(json).unwrap();
        let tile = s.tile(Coordinate::new(2, 1)).unwrap();
        assert_eq!(tile.money, 7);
        assert!(tile.is_owned_by(&home()));
    }

    #[test]
    fn out_of_bounds_lookup_is_an_error() {
        let s = Snapshot::new(4, 4, home()).unwrap();
        assert_eq!(
            s.tile(Coordinate::new(4, 0)),
            Err(SnapshotError::OutOfBounds(Coordinate::new(4, 0)))
        );
        assert!(s.tile(Coordinate::new(-1, 0)).is_err());
    }

    #[test]
    fn add_piece_rejects_duplicates_and_off_board() {
        let mut s = Snapshot::new(4, 4, home()).unwrap();
        let tank = Piece::new(PieceId(1), PieceKind::Tank, home(), Coordinate::new(0, 0));
        s.add_piece(tank.clone()).unwrap();
        assert_eq!(s.add_piece(tank), Err(SnapshotError::DuplicatePiece(PieceId(1))));

        let lost = Piece::new(PieceId(2), PieceKind::Tank, home(), Coordinate::new(9, 9));
        assert!(matches!(s.add_piece(lost), Err(SnapshotError::OutOfBounds(_))));
    }

    #[test]
    fn money_totals() {
        let mut s = Snapshot::new(3, 3, home()).unwrap();
        s.set_owner(Coordinate::new(0, 0), Some(home())).unwrap();
        s.set_money(Coordinate::new(0, 0), 7).unwrap();
        s.set_owner(Coordinate::new(1, 0), Some(Country::new("lichtenstein"))).unwrap();
        s.set_money(Coordinate::new(1, 0), 50).unwrap();
        s.add_piece(Piece::builder(PieceId(1), home(), Coordinate::new(0, 0), 4)).unwrap();
        s.add_piece(Piece::builder(PieceId(2), home(), Coordinate::new(1, 1), 6)).unwrap();

        assert_eq!(s.country_money(), 7);
        assert_eq!(s.builders_money(), 10);
        assert_eq!(s.countries().len(), 2);
        assert_eq!(s.tiles_owned_by(&home()), 1);
    }

    #[test]
    fn json_roundtrip_is_sparse() {
        let mut s = Snapshot::new(5, 5, home()).unwrap();
        s.set_owner(Coordinate::new(2, 2), Some(home())).unwrap();
        s.set_money(Coordinate::new(2, 2), 12).unwrap();
        s.add_piece(Piece::new(PieceId(3), PieceKind::Tank, home(), Coordinate::new(1, 1)))
            .unwrap();

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["tiles"].as_array().unwrap().len(), 1);
        let back: Snapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn json_rejects_duplicate_tiles() {
        let json = r#"{
            "width": 2, "height": 2, "my_country": "berzerkistan",
            "tiles": [
                {"coordinate": {"x": 0, "y": 0}, "money": 1},
                {"coordinate": {"x": 0, "y": 0}, "money": 2}
            ]
        }"#;
        let err = serde_json::from_str::<Snapshot>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate tile"));
    }
}
