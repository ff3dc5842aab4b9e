use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::direction::Direction;
use crate::engine::slide_line;
use crate::random::{spawn_value, RandomSource};

/// Opaque tile identity. Unique within a [`TileBoard`] and never reused by it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TileId(u64);

impl TileId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    pub value: u32,
    pub row: usize,
    pub col: usize,
    /// Where the tile sat before the last move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Position>,
    /// Created by the last move (or by a fresh game).
    #[serde(default)]
    pub spawned: bool,
    /// Absorbed another tile during the last move.
    #[serde(default)]
    pub merged: bool,
}

impl Tile {
    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMoveResult {
    pub tiles: TileBoard,
    pub moved: bool,
    pub score_gained: u32,
    pub merged_values: Vec<u32>,
    pub spawned: Option<TileId>,
}

/// Identity-bearing view of a board, used when presentation needs to follow
/// individual tiles across moves.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TileBoard {
    size: usize,
    tiles: Vec<Tile>,
    next_id: u64,
}

impl TileBoard {
    pub fn new(size: usize) -> Self {
        Self::starting_at(size, 0)
    }

    /// Empty board whose ids continue from `next_id`.
    pub(crate) fn starting_at(size: usize, next_id: u64) -> Self {
        Self {
            size,
            tiles: Vec::new(),
            next_id,
        }
    }

    /// Assigns fresh ids to every occupied cell, row by row.
    pub fn from_board(board: &Board) -> Self {
        let mut tiles = Self::new(board.size());
        for (row, cells) in board.rows().iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if value != 0 {
                    let id = tiles.allocate_id();
                    tiles.tiles.push(Tile {
                        id,
                        value,
                        row,
                        col,
                        from: None,
                        spawned: false,
                        merged: false,
                    });
                }
            }
        }
        tiles
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    pub fn tile_at(&self, position: Position) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.position() == position)
    }

    pub fn max_value(&self) -> u32 {
        self.tiles.iter().map(|tile| tile.value).max().unwrap_or(0)
    }

    pub fn to_board(&self) -> Board {
        let mut board = Board::new(self.size);
        for tile in &self.tiles {
            board.set(tile.position(), tile.value);
        }
        board
    }

    /// Places a freshly spawned tile. The cell must be empty.
    pub fn place(&mut self, position: Position, value: u32) -> TileId {
        debug_assert!(self.tile_at(position).is_none(), "cell already occupied");
        let id = self.allocate_id();
        self.tiles.push(Tile {
            id,
            value,
            row: position.row,
            col: position.col,
            from: None,
            spawned: true,
            merged: false,
        });
        id
    }

    /// Spawns a 2 or 4 on a random empty cell, if there is one.
    pub fn spawn<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Option<TileId> {
        let position = self.to_board().random_empty_cell(rng)?;
        let value = spawn_value(rng);
        Some(self.place(position, value))
    }

    /// Slides every tile toward `direction` without spawning. The tile nearer
    /// the target edge survives a merge and keeps its id; the other vanishes.
    /// Transient flags are recomputed for every surviving tile.
    pub fn shift(&self, direction: Direction) -> TileMoveResult {
        let mut grid: Vec<Option<usize>> = vec![None; self.size * self.size];
        for (index, tile) in self.tiles.iter().enumerate() {
            grid[tile.row * self.size + tile.col] = Some(index);
        }

        let mut next = Self::starting_at(self.size, self.next_id);
        let mut moved = false;
        let mut score_gained: u32 = 0;
        let mut merged_values = Vec::new();

        for index in 0..self.size {
            let cells = direction.line(self.size, index);
            let occupants: Vec<Option<&Tile>> = cells
                .iter()
                .map(|p| grid[p.row * self.size + p.col].map(|i| &self.tiles[i]))
                .collect();
            let line: Vec<u32> = occupants
                .iter()
                .map(|tile| tile.map_or(0, |t| t.value))
                .collect();

            let outcome = slide_line(&line);
            for (slot_index, slot) in outcome.slots.iter().enumerate() {
                let Some(source) = occupants[slot.source] else {
                    continue;
                };
                let target = cells[slot_index];
                next.tiles.push(Tile {
                    id: source.id,
                    value: slot.value,
                    row: target.row,
                    col: target.col,
                    from: Some(source.position()),
                    spawned: false,
                    merged: slot.absorbed.is_some(),
                });
            }
            moved |= outcome.moved();
            score_gained = score_gained.saturating_add(outcome.score);
            merged_values.extend(outcome.merged_values);
        }

        if !moved {
            return TileMoveResult {
                tiles: self.clone(),
                moved: false,
                score_gained: 0,
                merged_values: Vec::new(),
                spawned: None,
            };
        }

        TileMoveResult {
            tiles: next,
            moved,
            score_gained,
            merged_values,
            spawned: None,
        }
    }

    /// One full step over tiles: shift, then spawn when something moved.
    pub fn move_tiles<R: RandomSource + ?Sized>(
        &self,
        direction: Direction,
        rng: &mut R,
    ) -> TileMoveResult {
        let mut result = self.shift(direction);
        if result.moved {
            result.spawned = result.tiles.spawn(rng);
        }
        result
    }

    fn allocate_id(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::move_board;
    use crate::random::SequenceSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiles(rows: &[&[u32]]) -> TileBoard {
        let board = Board::from_rows(rows.iter().map(|row| row.to_vec()).collect()).unwrap();
        TileBoard::from_board(&board)
    }

    #[test]
    fn test_merge_keeps_leading_identity() {
        let start = tiles(&[&[2, 2, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let lead = start.tile_at(Position::new(0, 0)).unwrap().id;
        let trailing = start.tile_at(Position::new(0, 1)).unwrap().id;

        let result = start.shift(Direction::Left);
        assert!(result.moved);
        assert_eq!(result.score_gained, 4);
        assert_eq!(result.tiles.len(), 1);

        let merged = result.tiles.get(lead).unwrap();
        assert_eq!(merged.value, 4);
        assert!(merged.merged);
        assert_eq!(merged.position(), Position::new(0, 0));
        assert!(result.tiles.get(trailing).is_none());
    }

    #[test]
    fn test_moving_right_keeps_rightmost_identity() {
        let start = tiles(&[&[2, 2, 2, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let right = start.tile_at(Position::new(0, 2)).unwrap().id;
        let left = start.tile_at(Position::new(0, 0)).unwrap().id;

        let result = start.shift(Direction::Right);
        let merged = result.tiles.get(right).unwrap();
        assert_eq!(merged.value, 4);
        assert_eq!(merged.position(), Position::new(0, 3));
        assert_eq!(merged.from, Some(Position::new(0, 2)));

        let slid = result.tiles.get(left).unwrap();
        assert_eq!(slid.value, 2);
        assert!(!slid.merged);
        assert_eq!(slid.position(), Position::new(0, 2));
        assert_eq!(slid.from, Some(Position::new(0, 0)));
    }

    #[test]
    fn test_transient_flags_are_cleared_each_move() {
        let mut start = TileBoard::new(4);
        start.place(Position::new(0, 3), 2);
        assert!(start.tiles()[0].spawned);

        let mut rng = SequenceSource::constant(0.1);
        let first = start.move_tiles(Direction::Left, &mut rng);
        let original = first.tiles.get(start.tiles()[0].id).unwrap();
        assert!(!original.spawned);
        let spawned = first.tiles.get(first.spawned.unwrap()).unwrap();
        assert!(spawned.spawned);
        assert_eq!(spawned.value, 2);

        let second = first.tiles.move_tiles(Direction::Down, &mut rng);
        assert!(second.moved);
        assert!(second.tiles.tiles().iter().filter(|t| t.spawned).count() == 1);
        assert!(second
            .tiles
            .tiles()
            .iter()
            .all(|t| !t.merged || second.merged_values.contains(&t.value)));
    }

    #[test]
    fn test_no_op_move_leaves_tiles_untouched() {
        let start = tiles(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]]);
        let result = start.move_tiles(Direction::Up, &mut SequenceSource::constant(0.5));
        assert!(!result.moved);
        assert_eq!(result.tiles, start);
        assert!(result.spawned.is_none());
    }

    #[test]
    fn test_ids_are_unique_and_never_reused() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut current = TileBoard::new(4);
        current.spawn(&mut rng);
        current.spawn(&mut rng);
        let mut seen = std::collections::HashSet::new();
        for tile in current.tiles() {
            seen.insert(tile.id);
        }

        for step in 0..200 {
            let result = current.move_tiles(Direction::ALL[step % 4], &mut rng);
            if let Some(id) = result.spawned {
                assert!(seen.insert(id), "id {:?} reused", id);
            }
            let mut ids: Vec<TileId> = result.tiles.tiles().iter().map(|t| t.id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), result.tiles.len());
            current = result.tiles;
        }
    }

    #[test]
    fn test_tile_layer_matches_dense_engine() {
        let mut rng_tiles = StdRng::seed_from_u64(99);
        let mut rng_dense = StdRng::seed_from_u64(99);
        let mut tile_board = TileBoard::new(5);
        tile_board.place(Position::new(2, 2), 2);
        let mut dense = tile_board.to_board();

        for step in 0..300 {
            let direction = Direction::ALL[(step * 7 + step / 3) % 4];
            let tile_result = tile_board.move_tiles(direction, &mut rng_tiles);
            let dense_result = move_board(&dense, direction, &mut rng_dense);

            assert_eq!(tile_result.moved, dense_result.moved);
            assert_eq!(tile_result.score_gained, dense_result.score_gained);
            assert_eq!(tile_result.merged_values, dense_result.merged_values);
            assert_eq!(tile_result.tiles.to_board(), dense_result.board);

            tile_board = tile_result.tiles;
            dense = dense_result.board;
        }
    }
}
