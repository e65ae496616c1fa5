//! Grid coordinates and the Manhattan metric.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell position on the board. `x` grows rightwards, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Coordinate { x, y }
    }

    /// Manhattan distance to another coordinate.
    pub fn distance(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns the coordinate shifted by the given offsets.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Coordinate {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The four orthogonal neighbours, in +x, -x, +y, -y order.
    pub const fn neighbours(self) -> [Coordinate; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Coordinate { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Manhattan distance between two coordinates.
pub fn distance(a: Coordinate, b: Coordinate) -> u32 {
    a.distance(b)
}
