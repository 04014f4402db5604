use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A cell of the occupancy grid in raster order: `x` is the column and grows
/// to the east, `y` is the row and grows to the south.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Copy, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn manhattan_distance(&self, other: &Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn step(&self, heading: Heading) -> Point {
        let (dx, dy) = heading.step();
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

impl rstar::Point for Point {
    type Scalar = i32;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Point {
            x: generator(0),
            y: generator(1),
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!("a grid point has two dimensions"),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!("a grid point has two dimensions"),
        }
    }
}

/// One of the eight compass headings a walk may step along.
///
/// The heading automaton is the pair of constant tables behind
/// [`Heading::successors`] and [`Heading::opposite`]: from any heading a walk
/// may turn 45° left, continue straight or turn 45° right, never more.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Heading {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Heading {
    pub const ALL: [Heading; 8] = [
        Heading::North,
        Heading::NorthEast,
        Heading::East,
        Heading::SouthEast,
        Heading::South,
        Heading::SouthWest,
        Heading::West,
        Heading::NorthWest,
    ];

    /// Unit step `(dx, dy)`. North is `(0, -1)` since rows grow southwards.
    pub const fn step(self) -> (i32, i32) {
        match self {
            Heading::North => (0, -1),
            Heading::NorthEast => (1, -1),
            Heading::East => (1, 0),
            Heading::SouthEast => (1, 1),
            Heading::South => (0, 1),
            Heading::SouthWest => (-1, 1),
            Heading::West => (-1, 0),
            Heading::NorthWest => (-1, -1),
        }
    }

    pub fn from_step(dx: i32, dy: i32) -> Option<Heading> {
        Heading::ALL.into_iter().find(|heading| heading.step() == (dx, dy))
    }

    /// Legal next headings as `[left 45°, straight, right 45°]`. The order is
    /// the priority order in which the step chooser evaluates them.
    pub const fn successors(self) -> [Heading; 3] {
        match self {
            Heading::North => [Heading::NorthWest, Heading::North, Heading::NorthEast],
            Heading::NorthEast => [Heading::North, Heading::NorthEast, Heading::East],
            Heading::East => [Heading::NorthEast, Heading::East, Heading::SouthEast],
            Heading::SouthEast => [Heading::East, Heading::SouthEast, Heading::South],
            Heading::South => [Heading::SouthEast, Heading::South, Heading::SouthWest],
            Heading::SouthWest => [Heading::South, Heading::SouthWest, Heading::West],
            Heading::West => [Heading::SouthWest, Heading::West, Heading::NorthWest],
            Heading::NorthWest => [Heading::West, Heading::NorthWest, Heading::North],
        }
    }

    pub const fn opposite(self) -> Heading {
        match self {
            Heading::North => Heading::South,
            Heading::NorthEast => Heading::SouthWest,
            Heading::East => Heading::West,
            Heading::SouthEast => Heading::NorthWest,
            Heading::South => Heading::North,
            Heading::SouthWest => Heading::NorthEast,
            Heading::West => Heading::East,
            Heading::NorthWest => Heading::SouthEast,
        }
    }

    pub fn is_successor(self, next: Heading) -> bool {
        self.successors().contains(&next)
    }

    pub const fn abbreviation(self) -> &'static str {
        match self {
            Heading::North => "N",
            Heading::NorthEast => "NE",
            Heading::East => "E",
            Heading::SouthEast => "SE",
            Heading::South => "S",
            Heading::SouthWest => "SW",
            Heading::West => "W",
            Heading::NorthWest => "NW",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for Heading {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Heading::ALL
            .into_iter()
            .find(|heading| trimmed.eq_ignore_ascii_case(heading.abbreviation()))
            .ok_or_else(|| SearchError::InvalidHeading(s.to_string()))
    }
}
