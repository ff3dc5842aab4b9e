//! Turns a continuous drag into at most one swipe direction.

use crate::constants::SWIPE_THRESHOLD;
use crate::direction::Direction;

/// Classifies a drag displacement. Nothing happens until either axis reaches
/// `threshold`; then the axis with the larger displacement wins (ties go to
/// the vertical axis) and its sign picks the direction.
pub fn classify_swipe(dx: f64, dy: f64, threshold: f64) -> Option<Direction> {
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }
    let (abs_x, abs_y) = (dx.abs(), dy.abs());
    if abs_x < threshold && abs_y < threshold {
        return None;
    }
    if abs_x > abs_y {
        Some(if dx > 0.0 { Direction::Right } else { Direction::Left })
    } else {
        Some(if dy > 0.0 { Direction::Down } else { Direction::Up })
    }
}

/// Per-gesture lock: once a drag has produced a direction, further updates
/// are ignored until [`SwipeTracker::end`] is called.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeTracker {
    threshold: f64,
    locked: bool,
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(SWIPE_THRESHOLD)
    }
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            locked: false,
        }
    }

    /// Feeds the displacement since the gesture started.
    pub fn update(&mut self, dx: f64, dy: f64) -> Option<Direction> {
        if self.locked {
            return None;
        }
        let direction = classify_swipe(dx, dy, self.threshold)?;
        self.locked = true;
        Some(direction)
    }

    pub fn end(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_is_ignored() {
        assert_eq!(classify_swipe(49.0, -49.9, 50.0), None);
        assert_eq!(classify_swipe(0.0, 0.0, 50.0), None);
    }

    #[test]
    fn test_dominant_axis_wins() {
        assert_eq!(classify_swipe(80.0, 20.0, 50.0), Some(Direction::Right));
        assert_eq!(classify_swipe(-80.0, 79.0, 50.0), Some(Direction::Left));
        assert_eq!(classify_swipe(10.0, 60.0, 50.0), Some(Direction::Down));
        assert_eq!(classify_swipe(10.0, -60.0, 50.0), Some(Direction::Up));
        assert_eq!(classify_swipe(60.0, 60.0, 50.0), Some(Direction::Down));
    }

    #[test]
    fn test_non_finite_input() {
        assert_eq!(classify_swipe(f64::NAN, 90.0, 50.0), None);
    }

    #[test]
    fn test_tracker_locks_until_end() {
        let mut tracker = SwipeTracker::default();
        assert_eq!(tracker.update(10.0, 0.0), None);
        assert!(!tracker.is_locked());
        assert_eq!(tracker.update(-55.0, 3.0), Some(Direction::Left));
        assert!(tracker.is_locked());
        assert_eq!(tracker.update(0.0, 200.0), None);

        tracker.end();
        assert_eq!(tracker.update(0.0, 200.0), Some(Direction::Down));
    }
}
