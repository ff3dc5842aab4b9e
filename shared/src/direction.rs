use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::error::GameError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Cells of line `index` (a row for left/right, a column for up/down),
    /// ordered starting from the edge tiles slide toward.
    pub fn line(&self, size: usize, index: usize) -> Vec<Position> {
        (0..size)
            .map(|step| {
                let offset = match self {
                    Self::Left | Self::Up => step,
                    Self::Right | Self::Down => size - 1 - step,
                };
                if self.is_horizontal() {
                    Position::new(index, offset)
                } else {
                    Position::new(offset, index)
                }
            })
            .collect()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(GameError::UnknownDirection(s.to_string())),
        }
    }
}
