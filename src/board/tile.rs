//! Tiles and country ownership.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::coord::Coordinate;

/// A faction identifier, e.g. `berzerkistan`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Country(pub String);

impl Country {
    pub fn new(name: impl Into<String>) -> Self {
        Country(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One cell of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub coordinate: Coordinate,
    /// Owning country, `None` for neutral ground.
    #[serde(default)]
    pub country: Option<Country>,
    /// Money lying on the tile, collectable by builders of the owner.
    #[serde(default)]
    pub money: u32,
}

impl Tile {
    /// Creates a neutral tile with no money.
    pub fn neutral(coordinate: Coordinate) -> Self {
        Tile {
            coordinate,
            country: None,
            money: 0,
        }
    }

    /// Returns true if the tile belongs to the given country.
    pub fn is_owned_by(&self, country: &Country) -> bool {
        self.country.as_ref() == Some(country)
    }
}
