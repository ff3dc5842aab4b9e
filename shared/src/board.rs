use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_TILE_VALUE, MIN_BOARD_SIZE};
use crate::error::GameError;
use crate::random::RandomSource;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Dense N×N grid of tile values. `0` is an empty cell, every other value is
/// a power of two no smaller than 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u32>>", into = "Vec<Vec<u32>>")]
pub struct Board {
    size: usize,
    cells: Vec<Vec<u32>>,
}

impl Board {
    /// Creates an all-empty board.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![vec![0; size]; size],
        }
    }

    /// Builds a board from explicit rows, checking shape and tile values.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, GameError> {
        let size = rows.len();
        if size < MIN_BOARD_SIZE {
            return Err(GameError::InvalidSize(size));
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != size {
                return Err(GameError::RaggedBoard {
                    row,
                    expected: size,
                    found: cells.len(),
                });
            }
            for (col, &value) in cells.iter().enumerate() {
                if value != 0 && (value < 2 || !value.is_power_of_two()) {
                    return Err(GameError::InvalidTileValue { row, col, value });
                }
            }
        }
        Ok(Self { size, cells: rows })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.cells
    }

    pub fn get(&self, position: Position) -> u32 {
        self.cells[position.row][position.col]
    }

    pub fn set(&mut self, position: Position, value: u32) {
        self.cells[position.row][position.col] = value;
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Position> {
        let mut empty = Vec::new();
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if value == 0 {
                    empty.push(Position::new(row, col));
                }
            }
        }
        empty
    }

    /// Uniformly picks one empty cell, or `None` on a full board.
    pub fn random_empty_cell<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return None;
        }
        Some(empty[rng.pick_index(empty.len())])
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|&value| value != 0)
    }

    pub fn tile_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&value| value != 0).count()
    }

    pub fn sum(&self) -> u64 {
        self.cells.iter().flatten().map(|&value| value as u64).sum()
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// True when two horizontally or vertically neighbouring cells hold the
    /// same value and could still merge.
    pub fn has_adjacent_match(&self) -> bool {
        for row in 0..self.size {
            for col in 0..self.size {
                let value = self.cells[row][col];
                if value == 0 || value >= MAX_TILE_VALUE {
                    continue;
                }
                if col + 1 < self.size && self.cells[row][col + 1] == value {
                    return true;
                }
                if row + 1 < self.size && self.cells[row + 1][col] == value {
                    return true;
                }
            }
        }
        false
    }
}

impl TryFrom<Vec<Vec<u32>>> for Board {
    type Error = GameError;

    fn try_from(rows: Vec<Vec<u32>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Board> for Vec<Vec<u32>> {
    fn from(board: Board) -> Self {
        board.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.max_tile().max(1).to_string().len();
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row
                .iter()
                .map(|&value| match value {
                    0 => format!("{:>width$}", ".", width = width),
                    v => format!("{:>width$}", v, width = width),
                })
                .collect();
            f.write_str(&line.join(" "))?;
        }
        Ok(())
    }
}
