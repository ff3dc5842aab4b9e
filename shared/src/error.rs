use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    InvalidSize(usize),
    RaggedBoard { row: usize, expected: usize, found: usize },
    InvalidTileValue { row: usize, col: usize, value: u32 },
    UnknownDirection(String),
    UnknownLanguage(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize(size) => write!(f, "Invalid board size: {}", size),
            Self::RaggedBoard { row, expected, found } => write!(
                f,
                "Row {} has {} cells, expected {}",
                row, found, expected
            ),
            Self::InvalidTileValue { row, col, value } => write!(
                f,
                "Cell ({}, {}) holds {}, which is not a power of two",
                row, col, value
            ),
            Self::UnknownDirection(raw) => write!(f, "Unknown direction: {:?}", raw),
            Self::UnknownLanguage(raw) => write!(f, "Unknown language: {:?}", raw),
        }
    }
}

impl std::error::Error for GameError {}
