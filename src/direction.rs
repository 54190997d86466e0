use crate::error::BuildError;

use ilattice3::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight horizontal compass directions a room can be connected through.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

pub const CARDINAL_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

/// Which spelling of a direction a builder typed. The other spelling becomes the exit alias.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameForm {
    Short,
    Long,
}

struct DirectionInfo {
    short: &'static str,
    long: &'static str,
    dx: i32,
    dy: i32,
    opposite: Direction,
}

// Indexed by `Direction as usize`; order must match the enum declaration.
const DIRECTION_TABLE: [DirectionInfo; 8] = [
    DirectionInfo {
        short: "n",
        long: "north",
        dx: 0,
        dy: 1,
        opposite: Direction::South,
    },
    DirectionInfo {
        short: "ne",
        long: "northeast",
        dx: 1,
        dy: 1,
        opposite: Direction::SouthWest,
    },
    DirectionInfo {
        short: "e",
        long: "east",
        dx: 1,
        dy: 0,
        opposite: Direction::West,
    },
    DirectionInfo {
        short: "se",
        long: "southeast",
        dx: 1,
        dy: -1,
        opposite: Direction::NorthWest,
    },
    DirectionInfo {
        short: "s",
        long: "south",
        dx: 0,
        dy: -1,
        opposite: Direction::North,
    },
    DirectionInfo {
        short: "sw",
        long: "southwest",
        dx: -1,
        dy: -1,
        opposite: Direction::NorthEast,
    },
    DirectionInfo {
        short: "w",
        long: "west",
        dx: -1,
        dy: 0,
        opposite: Direction::East,
    },
    DirectionInfo {
        short: "nw",
        long: "northwest",
        dx: -1,
        dy: 1,
        opposite: Direction::SouthEast,
    },
];

impl Direction {
    fn info(self) -> &'static DirectionInfo {
        &DIRECTION_TABLE[self as usize]
    }

    /// Parses either spelling of a direction, ignoring case.
    pub fn resolve(token: &str) -> Result<Self, BuildError> {
        Self::resolve_with_form(token).map(|(d, _)| d)
    }

    /// Like `resolve`, but also reports which spelling was used.
    pub fn resolve_with_form(token: &str) -> Result<(Self, NameForm), BuildError> {
        let lower = token.trim().to_lowercase();
        for d in ALL_DIRECTIONS.iter() {
            let info = d.info();
            if lower == info.short {
                return Ok((*d, NameForm::Short));
            }
            if lower == info.long {
                return Ok((*d, NameForm::Long));
            }
        }

        Err(BuildError::UnknownDirection(token.to_string()))
    }

    /// Like `resolve_with_form`, but rejects diagonals.
    pub fn resolve_cardinal(token: &str) -> Result<(Self, NameForm), BuildError> {
        let (d, form) = Self::resolve_with_form(token)?;
        if d.is_cardinal() {
            Ok((d, form))
        } else {
            Err(BuildError::InvalidDirection(d))
        }
    }

    pub fn short_name(self) -> &'static str {
        self.info().short
    }

    pub fn long_name(self) -> &'static str {
        self.info().long
    }

    pub fn name(self, form: NameForm) -> &'static str {
        match form {
            NameForm::Short => self.short_name(),
            NameForm::Long => self.long_name(),
        }
    }

    pub fn opposite(self) -> Self {
        self.info().opposite
    }

    /// Unit displacement. The z component is always zero.
    pub fn vector(self) -> Point {
        let info = self.info();

        [info.dx, info.dy, 0].into()
    }

    pub fn is_cardinal(self) -> bool {
        let info = self.info();

        (info.dx == 0) != (info.dy == 0)
    }

    /// `p` moved `n` steps in this direction, or `None` past the edge of the lattice.
    pub fn advance(self, p: Point, n: i32) -> Option<Point> {
        let v = self.vector();
        let x = p.x.checked_add(v.x.checked_mul(n)?)?;
        let y = p.y.checked_add(v.y.checked_mul(n)?)?;

        Some([x, y, p.z].into())
    }

    /// `p` moved one step in this direction, or `None` past the edge of the lattice.
    pub fn step(self, p: Point) -> Option<Point> {
        self.advance(p, 1)
    }

    /// Like `step`, but the edge of the lattice is an `OutOfRange` error.
    pub fn try_step(self, p: Point) -> Result<Point, BuildError> {
        self.step(p).ok_or(BuildError::OutOfRange {
            x: p.x,
            y: p.y,
            z: p.z,
            direction: self,
        })
    }

    /// The direction whose vector is exactly `to - from`, if any.
    pub fn between(from: Point, to: Point) -> Option<Self> {
        let delta = |a: i32, b: i32| i64::from(b) - i64::from(a);
        if delta(from.z, to.z) != 0 {
            return None;
        }
        let (dx, dy) = (delta(from.x, to.x), delta(from.y, to.y));

        ALL_DIRECTIONS
            .iter()
            .cloned()
            .find(|d| i64::from(d.info().dx) == dx && i64::from(d.info().dy) == dy)
    }

    /// True if `word` is either spelling of this direction, ignoring case.
    pub fn matches(self, word: &str) -> bool {
        let info = self.info();

        word.eq_ignore_ascii_case(info.short) || word.eq_ignore_ascii_case(info.long)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name())
    }
}
