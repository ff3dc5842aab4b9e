pub mod audio;
pub mod board;
pub mod constants;
pub mod direction;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod random;
pub mod settings;
pub mod shared_2048_game;
pub mod tile;

pub use board::{Board, Position};
pub use direction::Direction;
pub use engine::{is_game_over, move_board, MoveResult};
pub use error::GameError;
pub use random::{RandomSource, SequenceSource};
pub use shared_2048_game::{Game2048, MoveOutcome, PublicGame2048};
pub use tile::{Tile, TileBoard, TileId};
