//! Audio cues. The engine never plays sound itself; callers derive cues from
//! a move outcome and hand them to whatever [`AudioSink`] they own.

use serde::{Deserialize, Serialize};

use crate::shared_2048_game::MoveOutcome;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SoundEvent {
    Swipe,
    Merge,
    Win,
}

pub trait AudioSink {
    fn play(&mut self, event: SoundEvent);
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
}

/// Cues for one swipe: the swipe itself, a merge if anything merged, and a
/// win on the move that first reached the winning tile.
pub fn cues_for_move(outcome: &MoveOutcome) -> Vec<SoundEvent> {
    let mut cues = vec![SoundEvent::Swipe];
    if !outcome.merged_values.is_empty() {
        cues.push(SoundEvent::Merge);
    }
    if outcome.just_won {
        cues.push(SoundEvent::Win);
    }
    cues
}

pub fn dispatch<A: AudioSink + ?Sized>(sink: &mut A, outcome: &MoveOutcome) {
    for cue in cues_for_move(outcome) {
        sink.play(cue);
    }
}

/// Sink that remembers what it was asked to play, for shipping cues to a
/// client that owns the speakers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueRecorder {
    enabled: bool,
    played: Vec<SoundEvent>,
}

impl Default for CueRecorder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CueRecorder {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            played: Vec::new(),
        }
    }

    pub fn played(&self) -> &[SoundEvent] {
        &self.played
    }

    pub fn take(&mut self) -> Vec<SoundEvent> {
        std::mem::take(&mut self.played)
    }
}

impl AudioSink for CueRecorder {
    fn play(&mut self, event: SoundEvent) {
        if self.enabled {
            self.played.push(event);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
