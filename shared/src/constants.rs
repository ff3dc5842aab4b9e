pub const WIN_TILE: u32 = 2048;

/// Largest value a cell can hold. Two of these never merge.
pub const MAX_TILE_VALUE: u32 = 1 << 31;

/// Chance that a spawned tile is a 2 rather than a 4.
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;

pub const MIN_BOARD_SIZE: usize = 4;
pub const DEFAULT_BOARD_SIZE: usize = 4;
pub const SUPPORTED_SIZES: [usize; 3] = [4, 5, 6];

pub const INITIAL_TILE_COUNT: usize = 2;

/// Drag distance (in points) before a gesture turns into a swipe.
pub const SWIPE_THRESHOLD: f64 = 50.0;

pub const BEST_SCORE_KEY_PREFIX: &str = "BEST_SCORE_2048_";
pub const LANGUAGE_KEY: &str = "language";
pub const SOUND_ENABLED_KEY: &str = "SOUND_ENABLED";

pub fn best_score_key(size: usize) -> String {
    format!("{}{}", BEST_SCORE_KEY_PREFIX, size)
}

pub fn is_supported_size(size: usize) -> bool {
    SUPPORTED_SIZES.contains(&size)
}
