use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::constants::{INITIAL_TILE_COUNT, MIN_BOARD_SIZE, WIN_TILE};
use crate::direction::Direction;
use crate::engine::is_game_over;
use crate::error::GameError;
use crate::random::{spawn_value, RandomSource};
use crate::tile::{Tile, TileBoard, TileId};

/// One game of 2048 on a fixed-size board: tiles, running score and the
/// win / game-over flags derived after every move.
#[derive(Debug, Serialize, Clone)]
pub struct Game2048 {
    size: usize,
    tiles: TileBoard,
    score: u32,
    game_over: bool,
    has_won: bool,
    last_merged: Vec<u32>,
    moves: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PublicGame2048 {
    pub size: usize,
    pub board: Vec<Vec<u32>>,
    pub tiles: Vec<Tile>,
    pub score: u32,
    pub game_over: bool,
    pub has_won: bool,
    pub last_merged: Vec<u32>,
    pub moves: u32,
}

/// What a single call to [`Game2048::make_move`] did.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct MoveOutcome {
    pub moved: bool,
    pub score_gained: u32,
    pub merged_values: Vec<u32>,
    pub spawned: Option<TileId>,
    /// The move that first produced a winning tile.
    pub just_won: bool,
    pub game_over: bool,
}

impl Game2048 {
    /// Starts a game with two tiles on distinct random cells: the first is
    /// always a 2, the second follows the usual 2/4 odds.
    pub fn new<R: RandomSource + ?Sized>(size: usize, rng: &mut R) -> Result<Self, GameError> {
        if size < MIN_BOARD_SIZE {
            return Err(GameError::InvalidSize(size));
        }
        Ok(Self {
            size,
            tiles: initial_tiles(size, 0, rng),
            score: 0,
            game_over: false,
            has_won: false,
            last_merged: Vec::new(),
            moves: 0,
        })
    }

    /// Resumes play from an explicit board. Flags are derived from it.
    pub fn from_board(board: &Board, score: u32) -> Self {
        let tiles = TileBoard::from_board(board);
        Self {
            size: board.size(),
            has_won: tiles.max_value() >= WIN_TILE,
            game_over: is_game_over(board),
            tiles,
            score,
            last_merged: Vec::new(),
            moves: 0,
        }
    }

    /// Throws the current game away and deals a fresh one of the same size.
    /// Tile ids keep counting up, so nothing from the old game is reused.
    pub fn reset<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        let next_id = self.tiles.next_id();
        *self = Self {
            size: self.size,
            tiles: initial_tiles(self.size, next_id, rng),
            score: 0,
            game_over: false,
            has_won: false,
            last_merged: Vec::new(),
            moves: 0,
        };
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn has_won(&self) -> bool {
        self.has_won
    }

    pub fn last_merged(&self) -> &[u32] {
        &self.last_merged
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn tiles(&self) -> &TileBoard {
        &self.tiles
    }

    pub fn board(&self) -> Board {
        self.tiles.to_board()
    }

    pub fn max_tile(&self) -> u32 {
        self.tiles.max_value()
    }

    /// Returns a public representation of the game state for clients.
    pub fn to_public(&self) -> PublicGame2048 {
        PublicGame2048 {
            size: self.size,
            board: self.board().into(),
            tiles: self.tiles.tiles().to_vec(),
            score: self.score,
            game_over: self.game_over,
            has_won: self.has_won,
            last_merged: self.last_merged.clone(),
            moves: self.moves,
        }
    }

    /// Applies one move. A finished game and a move that changes nothing are
    /// both no-ops that leave the session untouched.
    pub fn make_move<R: RandomSource + ?Sized>(
        &mut self,
        direction: Direction,
        rng: &mut R,
    ) -> MoveOutcome {
        if self.game_over {
            return MoveOutcome {
                game_over: true,
                ..MoveOutcome::default()
            };
        }

        let result = self.tiles.move_tiles(direction, rng);
        if !result.moved {
            return MoveOutcome::default();
        }

        self.tiles = result.tiles;
        self.score = self.score.saturating_add(result.score_gained);
        self.last_merged = result.merged_values.clone();
        self.moves += 1;

        let just_won = !self.has_won && self.tiles.max_value() >= WIN_TILE;
        if just_won {
            self.has_won = true;
        }
        let board = self.tiles.to_board();
        self.game_over = is_game_over(&board);

        log::debug!(
            "{} on {}x{}: +{} (score {}), merged {:?}{}",
            direction,
            self.size,
            self.size,
            result.score_gained,
            self.score,
            result.merged_values,
            if self.game_over { ", game over" } else { "" }
        );
        log::trace!("board after {}:\n{}", direction, board);

        MoveOutcome {
            moved: true,
            score_gained: result.score_gained,
            merged_values: result.merged_values,
            spawned: result.spawned,
            just_won,
            game_over: self.game_over,
        }
    }
}

fn initial_tiles<R: RandomSource + ?Sized>(size: usize, next_id: u64, rng: &mut R) -> TileBoard {
    let mut cells: Vec<Position> = (0..size)
        .flat_map(|row| (0..size).map(move |col| Position::new(row, col)))
        .collect();
    let mut tiles = TileBoard::starting_at(size, next_id);

    for n in 0..INITIAL_TILE_COUNT.min(cells.len()) {
        let cell = cells.remove(rng.pick_index(cells.len()));
        let value = if n == 0 { 2 } else { spawn_value(rng) };
        tiles.place(cell, value);
    }
    tiles
}
