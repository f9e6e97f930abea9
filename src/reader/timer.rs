//! Word reveal timing and the cancellable reveal timer

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    constants::reading::{MAX_SPEED, PAUSE_WEIGHT, SPEED_FACTOR, SPEED_OFFSET},
    question::Word,
};

/// How long a word stays the newest visible word before the next one appears
///
/// Longer words take longer, words ending a sentence and the power marker
/// add a pause, and a higher `speed` shortens every delay. Speeds above the
/// maximum are treated as the maximum.
pub fn word_delay(word: &Word, speed: u8) -> Duration {
    let length = word.text.chars().count().max(1) as f64;
    let pause = if word.is_power_marker() || word.text.ends_with(['.', '!', '?']) {
        PAUSE_WEIGHT
    } else {
        0.0
    };
    let scale = SPEED_FACTOR * (SPEED_OFFSET - f64::from(speed.min(MAX_SPEED)));

    Duration::from_secs_f64((length.ln() + 1.0 + pause) * scale / 1000.0)
}

/// Single-shot handle for the pending reveal step
///
/// Every arming hands out a new generation. A firing is accepted only for
/// the generation the timer is currently armed with, so a step scheduled
/// before a buzz, a cancellation, or a new question can never run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealTimer {
    generation: u64,
    armed: bool,
}

impl RevealTimer {
    /// Arms the timer for a new step and returns its generation
    pub fn arm(&mut self) -> u64 {
        self.generation += 1;
        self.armed = true;
        self.generation
    }

    /// Disarms the timer, returning whether a step was pending
    pub fn cancel(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }

    /// Accepts a firing of `generation`, disarming the timer
    ///
    /// Returns `false` for stale or repeated firings.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.armed && generation == self.generation {
            self.armed = false;
            true
        } else {
            tracing::trace!(
                generation,
                current = self.generation,
                armed = self.armed,
                "dropping stale reveal step"
            );
            false
        }
    }

    /// Whether a step is pending
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Generation of the most recent arming
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
