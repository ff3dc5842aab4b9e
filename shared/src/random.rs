use rand::Rng;

use crate::constants::SPAWN_TWO_PROBABILITY;

/// Randomness consumed by spawning. Every `rand::Rng` already is one; tests
/// and replays can plug in a [`SequenceSource`] instead.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        let index = (self.next_unit() * len as f64) as usize;
        index.min(len - 1)
    }
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Replays a fixed list of unit draws, wrapping around at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// A source that always yields `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// 2 with probability 0.9, otherwise 4.
pub fn spawn_value<R: RandomSource + ?Sized>(rng: &mut R) -> u32 {
    if rng.next_unit() < SPAWN_TWO_PROBABILITY {
        2
    } else {
        4
    }
}
