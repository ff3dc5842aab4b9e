//! Move engine: slides and merges a board toward one edge, spawns the
//! follow-up tile and answers the terminal questions (won / game over).
//!
//! All four directions go through [`slide_line`]: a line is read starting
//! from the edge tiles move toward, compacted, then written back in the same
//! order. The identity-tracking layer in [`crate::tile`] reuses the same
//! line plan, so merge rules live in exactly one place.

use serde::Serialize;

use crate::board::{Board, Position};
use crate::constants::WIN_TILE;
use crate::direction::Direction;
use crate::random::{spawn_value, RandomSource};

/// One occupied slot of a compacted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Index in the input line of the tile that landed here.
    pub source: usize,
    /// Index of the tile it absorbed, if this slot merged.
    pub absorbed: Option<usize>,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineOutcome {
    /// Occupied slots, slot `i` sits at index `i` of the output line.
    pub slots: Vec<Slot>,
    pub score: u32,
    pub merged_values: Vec<u32>,
}

impl LineOutcome {
    pub fn moved(&self) -> bool {
        self.slots
            .iter()
            .enumerate()
            .any(|(index, slot)| slot.source != index || slot.absorbed.is_some())
    }

    /// Output line padded with empty cells up to `len`.
    pub fn values(&self, len: usize) -> Vec<u32> {
        let mut values: Vec<u32> = self.slots.iter().map(|slot| slot.value).collect();
        values.resize(len, 0);
        values
    }
}

/// Compacts one line toward index 0.
///
/// A tile merges into the last placed tile when the values match and that
/// tile has not merged yet this move; after a merge nothing else may merge
/// into the same slot, so `[2, 2, 2]` becomes `[4, 2]` and never `[8]`.
/// Tiles at [`MAX_TILE_VALUE`](crate::constants::MAX_TILE_VALUE) stay put instead of overflowing; the score
/// saturates.
pub fn slide_line(line: &[u32]) -> LineOutcome {
    let mut outcome = LineOutcome {
        slots: Vec::with_capacity(line.len()),
        ..LineOutcome::default()
    };
    let mut last_placed: Option<usize> = None;

    for (index, &value) in line.iter().enumerate() {
        if value == 0 {
            continue;
        }
        let merge = last_placed
            .filter(|&slot_index| {
                let slot = &outcome.slots[slot_index];
                slot.value == value && slot.absorbed.is_none()
            })
            .and_then(|slot_index| value.checked_mul(2).map(|doubled| (slot_index, doubled)));

        match merge {
            Some((slot_index, doubled)) => {
                let slot = &mut outcome.slots[slot_index];
                slot.value = doubled;
                slot.absorbed = Some(index);
                outcome.score = outcome.score.saturating_add(doubled);
                outcome.merged_values.push(doubled);
                last_placed = None;
            }
            None => {
                outcome.slots.push(Slot {
                    source: index,
                    absorbed: None,
                    value,
                });
                last_placed = Some(outcome.slots.len() - 1);
            }
        }
    }

    outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Spawn {
    pub position: Position,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    pub board: Board,
    pub moved: bool,
    pub score_gained: u32,
    pub merged_values: Vec<u32>,
    pub spawned: Option<Spawn>,
}

/// Slides and merges every line without spawning anything.
pub fn shift_board(board: &Board, direction: Direction) -> MoveResult {
    let size = board.size();
    let mut next = Board::new(size);
    let mut moved = false;
    let mut score_gained: u32 = 0;
    let mut merged_values = Vec::new();

    for index in 0..size {
        let cells = direction.line(size, index);
        let line: Vec<u32> = cells.iter().map(|&position| board.get(position)).collect();
        let outcome = slide_line(&line);

        for (&position, value) in cells.iter().zip(outcome.values(size)) {
            next.set(position, value);
        }
        moved |= outcome.moved();
        score_gained = score_gained.saturating_add(outcome.score);
        merged_values.extend(outcome.merged_values);
    }

    if !moved {
        return MoveResult {
            board: board.clone(),
            moved: false,
            score_gained: 0,
            merged_values: Vec::new(),
            spawned: None,
        };
    }

    MoveResult {
        board: next,
        moved,
        score_gained,
        merged_values,
        spawned: None,
    }
}

/// Plays one full step: shift, then spawn a tile if anything moved.
pub fn move_board<R: RandomSource + ?Sized>(
    board: &Board,
    direction: Direction,
    rng: &mut R,
) -> MoveResult {
    let mut result = shift_board(board, direction);
    if result.moved {
        result.spawned = spawn_tile(&mut result.board, rng);
    }
    result
}

/// Drops a 2 or a 4 on a random empty cell. Does nothing on a full board.
pub fn spawn_tile<R: RandomSource + ?Sized>(board: &mut Board, rng: &mut R) -> Option<Spawn> {
    let position = board.random_empty_cell(rng)?;
    let value = spawn_value(rng);
    board.set(position, value);
    log::trace!("spawned {} at ({}, {})", value, position.row, position.col);
    Some(Spawn { position, value })
}

/// Full board with no equal neighbours. Never true while a cell is empty.
pub fn is_game_over(board: &Board) -> bool {
    board.is_full() && !board.has_adjacent_match()
}

pub fn has_won(board: &Board) -> bool {
    board.max_tile() >= WIN_TILE
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_TILE_VALUE;
    use crate::random::SequenceSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board(rows: &[&[u32]]) -> Board {
        Board::from_rows(rows.iter().map(|row| row.to_vec()).collect()).unwrap()
    }

    fn checkerboard() -> Board {
        board(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]])
    }

    /// 4x4 board with `row` on top and nothing else.
    fn top_row(row: [u32; 4]) -> Board {
        let mut rows = vec![vec![0; 4]; 4];
        rows[0] = row.to_vec();
        Board::from_rows(rows).unwrap()
    }

    #[test]
    fn test_slide_line_basic_merge() {
        let outcome = slide_line(&[2, 2, 0, 0]);
        assert_eq!(outcome.values(4), vec![4, 0, 0, 0]);
        assert_eq!(outcome.score, 4);
        assert_eq!(outcome.merged_values, vec![4]);
        assert!(outcome.moved());
    }

    #[test]
    fn test_slide_line_no_chain_merge() {
        let outcome = slide_line(&[2, 0, 2, 2]);
        assert_eq!(outcome.values(4), vec![4, 2, 0, 0]);
        assert_eq!(outcome.score, 4);

        let outcome = slide_line(&[4, 4, 8, 0]);
        assert_eq!(outcome.values(4), vec![8, 8, 0, 0]);
        assert_eq!(outcome.merged_values, vec![8]);

        let outcome = slide_line(&[2, 2, 2, 2]);
        assert_eq!(outcome.values(4), vec![4, 4, 0, 0]);
        assert_eq!(outcome.score, 8);
        assert_eq!(outcome.merged_values, vec![4, 4]);
    }

    #[test]
    fn test_slide_line_gaps_do_not_block_merge() {
        let outcome = slide_line(&[0, 8, 0, 8]);
        assert_eq!(outcome.values(4), vec![16, 0, 0, 0]);
        assert_eq!(
            outcome.slots,
            vec![Slot { source: 1, absorbed: Some(3), value: 16 }]
        );
    }

    #[test]
    fn test_slide_line_packed_line_does_not_move() {
        let outcome = slide_line(&[2, 4, 8, 0]);
        assert!(!outcome.moved());
        assert_eq!(outcome.score, 0);
        assert!(!slide_line(&[0, 0, 0, 0]).moved());
    }

    #[test]
    fn test_move_left_scenario() {
        let start = board(&[&[2, 2, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let result = shift_board(&start, Direction::Left);
        assert!(result.moved);
        assert_eq!(result.score_gained, 4);
        assert_eq!(result.board.rows()[0], vec![4, 0, 0, 0]);
    }

    #[test]
    fn test_move_left_trailing_tile_does_not_remerge() {
        let start = board(&[&[2, 0, 2, 2], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let result = shift_board(&start, Direction::Left);
        assert_eq!(result.board.rows()[0], vec![4, 2, 0, 0]);
        assert_eq!(result.score_gained, 4);
    }

    #[test]
    fn test_each_direction() {
        let start = board(&[&[2, 0, 0, 2], &[0, 0, 0, 0], &[0, 0, 0, 0], &[2, 0, 0, 0]]);

        let right = shift_board(&start, Direction::Right).board;
        assert_eq!(right.rows()[0], vec![0, 0, 0, 4]);
        assert_eq!(right.rows()[3], vec![0, 0, 0, 2]);

        let up = shift_board(&start, Direction::Up).board;
        assert_eq!(up.rows()[0], vec![4, 0, 0, 2]);
        assert_eq!(up.tile_count(), 2);

        let down = shift_board(&start, Direction::Down).board;
        assert_eq!(down.rows()[3], vec![4, 0, 0, 2]);
        assert_eq!(down.tile_count(), 2);
    }

    #[test]
    fn test_checkerboard_is_stuck_and_over() {
        let stuck = checkerboard();
        for direction in Direction::ALL {
            let result = move_board(&stuck, direction, &mut SequenceSource::constant(0.5));
            assert!(!result.moved);
            assert_eq!(result.board, stuck);
            assert_eq!(result.score_gained, 0);
            assert!(result.spawned.is_none());
        }
        assert!(is_game_over(&stuck));
    }

    #[test]
    fn test_game_over_requires_full_board() {
        let mut open = checkerboard();
        open.set(Position::new(2, 2), 0);
        assert!(!is_game_over(&open));

        let mut mergeable = checkerboard();
        mergeable.set(Position::new(0, 0), 4);
        assert!(mergeable.is_full());
        assert!(!is_game_over(&mergeable));
        assert!(shift_board(&mergeable, Direction::Left).moved);
    }

    #[test]
    fn test_spawn_value_follows_draw() {
        let start = board(&[&[2, 2, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);

        let result = move_board(&start, Direction::Left, &mut SequenceSource::constant(0.95));
        assert_eq!(result.spawned.map(|s| s.value), Some(4));

        let result = move_board(&start, Direction::Left, &mut SequenceSource::constant(0.1));
        let spawn = result.spawned.unwrap();
        assert_eq!(spawn.value, 2);
        assert_eq!(result.board.get(spawn.position), 2);
        assert_eq!(result.board.tile_count(), 2);
    }

    #[test]
    fn test_spawn_picks_among_empty_cells_in_row_major_order() {
        let start = top_row([0, 0, 0, 2]);
        let result = move_board(&start, Direction::Right, &mut SequenceSource::new(vec![0.5, 0.1]));
        assert!(!result.moved);

        // 15 cells are empty after moving right; a 0.5 draw picks index 7,
        // the first cell of the third row.
        let start = top_row([2, 0, 0, 0]);
        let result = move_board(&start, Direction::Right, &mut SequenceSource::new(vec![0.5, 0.1]));
        assert!(result.moved);
        assert_eq!(
            result.spawned,
            Some(Spawn { position: Position::new(2, 0), value: 2 })
        );
    }

    #[test]
    fn test_spawn_on_full_board_is_skipped() {
        let mut full = checkerboard();
        let before = full.clone();
        assert_eq!(spawn_tile(&mut full, &mut SequenceSource::constant(0.3)), None);
        assert_eq!(full, before);
    }

    #[test]
    fn test_win_threshold() {
        assert!(!has_won(&top_row([1024, 1024, 0, 0])));
        let merged = shift_board(&top_row([1024, 1024, 0, 0]), Direction::Left);
        assert!(has_won(&merged.board));
        assert_eq!(merged.merged_values, vec![2048]);
        assert!(has_won(&top_row([4096, 0, 0, 0])));
    }

    #[test]
    fn test_top_value_tiles_never_merge() {
        let top = MAX_TILE_VALUE;
        let outcome = slide_line(&[top, top, 0, 0]);
        assert!(!outcome.moved());
        assert_eq!(outcome.values(4), vec![top, top, 0, 0]);
        assert_eq!(outcome.score, 0);

        let result = shift_board(&top_row([0, top, 0, top]), Direction::Left);
        assert!(result.moved);
        assert_eq!(result.board.rows()[0], vec![top, top, 0, 0]);
        assert_eq!(result.score_gained, 0);
        assert!(result.merged_values.is_empty());
    }

    #[test]
    fn test_huge_merges_saturate_the_score() {
        let half = MAX_TILE_VALUE / 2;
        let result = shift_board(&top_row([half; 4]), Direction::Left);
        assert_eq!(
            result.board.rows()[0],
            vec![MAX_TILE_VALUE, MAX_TILE_VALUE, 0, 0]
        );
        assert_eq!(result.merged_values, vec![MAX_TILE_VALUE, MAX_TILE_VALUE]);
        assert_eq!(result.score_gained, u32::MAX);

        // One merge per row, the total only overflows across rows.
        let rows = vec![vec![half, half, 0, 0]; 4];
        let result = shift_board(&Board::from_rows(rows).unwrap(), Direction::Left);
        assert_eq!(result.merged_values.len(), 4);
        assert_eq!(result.score_gained, u32::MAX);
    }

    #[test]
    fn test_board_of_top_tiles_is_over() {
        let full = Board::from_rows(vec![vec![MAX_TILE_VALUE; 4]; 4]).unwrap();
        assert!(is_game_over(&full));
        for direction in Direction::ALL {
            assert!(!shift_board(&full, direction).moved);
        }
    }

    #[test]
    fn test_random_play_invariants() {
        let mut rng = StdRng::seed_from_u64(2048);
        for size in [4usize, 5, 6] {
            let mut current = Board::new(size);
            spawn_tile(&mut current, &mut rng);
            spawn_tile(&mut current, &mut rng);

            for step in 0..400 {
                let direction = Direction::ALL[step % 4];
                let before_count = current.tile_count();
                let before_sum = current.sum();
                let result = move_board(&current, direction, &mut rng);

                if !result.moved {
                    assert_eq!(result.board, current);
                    assert_eq!(result.score_gained, 0);
                    assert!(result.merged_values.is_empty());
                    continue;
                }

                let spawned = result.spawned.map(|s| s.value as u64).unwrap_or(0);
                assert_eq!(result.board.sum(), before_sum + spawned);

                let merges = result.merged_values.len();
                let spawned_count = usize::from(result.spawned.is_some());
                assert_eq!(result.board.tile_count(), before_count - merges + spawned_count);
                assert_eq!(
                    result.score_gained,
                    result.merged_values.iter().sum::<u32>()
                );
                if !result.board.is_full() {
                    assert!(!is_game_over(&result.board));
                }
                current = result.board;
            }
        }
    }
}
