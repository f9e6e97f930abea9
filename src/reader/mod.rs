//! Timed reading and buzz state machines
//!
//! A reader owns one question at a time. It pops questions from its
//! [`queue::PendingQueue`], reveals their words on alarms scheduled through
//! the host, freezes the reveal on a buzz, and judges submissions until a
//! terminal verdict produces a result.
//!
//! Both readers move through the same [`Status`] values and every change
//! goes through [`Status::can_transition`], so an operation issued at the
//! wrong time is rejected instead of corrupting state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::ReaderConfig,
    scoring::ScoringError,
    source::QuestionSource,
};

pub mod bonus;
pub mod queue;
pub mod reveal;
pub mod timer;
pub mod tossup;

use queue::PendingQueue;
use reveal::{BuzzSnapshot, Reveal};
use timer::{RevealTimer, word_delay};

/// Phase of a reader
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Waiting for a synchronous fetch because the queue ran dry
    Fetching,
    /// Revealing words
    Reading,
    /// Waiting for an answer after a buzz
    Answering,
    /// Waiting for a more specific answer after a prompt
    Prompting,
    /// The question has a result
    Judged,
    /// The source has no more questions
    Empty,
}

impl Status {
    /// Whether a reader may move from `self` to `to`
    pub fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Idle | Self::Judged | Self::Empty, Self::Fetching)
                | (Self::Idle | Self::Judged | Self::Fetching, Self::Reading)
                | (Self::Fetching, Self::Empty)
                | (Self::Reading, Self::Answering)
                | (
                    Self::Answering | Self::Prompting,
                    Self::Prompting | Self::Judged | Self::Reading
                )
                | (Self::Judged | Self::Empty, Self::Idle)
        )
    }
}

/// A reader operation was issued at the wrong time
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize)]
pub enum TransitionError {
    /// The transition table has no edge between the two statuses
    #[error("cannot move from {from:?} to {to:?}")]
    Illegal {
        /// Status before the attempted transition
        from: Status,
        /// Requested status
        to: Status,
    },
    /// The operation is not available in the current status
    #[error("cannot {operation} while {status:?}")]
    WrongStatus {
        /// What was attempted
        operation: &'static str,
        /// Status at the time
        status: Status,
    },
    /// The operation needs an active question and there is none
    #[error("cannot {operation} without an active question")]
    NoQuestion {
        /// What was attempted
        operation: &'static str,
    },
}

/// Errors returned by reader operations
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize)]
pub enum Error {
    /// The operation was issued at the wrong time
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// A result could not be scored
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Status and reveal timer of a reader
///
/// Leaving [`Status::Reading`] always cancels the pending reveal step, and
/// the timer's generations keep counting across questions.
#[derive(Debug, Clone, Default)]
pub(crate) struct Lifecycle {
    status: Status,
    timer: RevealTimer,
}

impl Lifecycle {
    pub(crate) fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn transition(&mut self, to: Status) -> Result<(), TransitionError> {
        let from = self.status;
        if !from.can_transition(to) {
            return Err(TransitionError::Illegal { from, to });
        }
        if from == Status::Reading && self.timer.cancel() {
            tracing::trace!(generation = self.timer.generation(), "cancelled reveal step");
        }
        self.status = to;
        tracing::debug!(?from, ?to, "reader status changed");
        Ok(())
    }

    pub(crate) fn require(
        &self,
        operation: &'static str,
        allowed: &[Status],
    ) -> Result<(), TransitionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(TransitionError::WrongStatus {
                operation,
                status: self.status,
            })
        }
    }

    /// Arms the timer for the next word, or returns `None` once every word is visible
    pub(crate) fn arm(&mut self, reveal: &Reveal, speed: u8) -> Option<(u64, Duration)> {
        let word = reveal.next_word()?;
        Some((self.timer.arm(), word_delay(word, speed)))
    }

    /// Schedules the next reveal step through `schedule_message`
    ///
    /// Returns `false` without scheduling anything once every word is visible.
    pub(crate) fn schedule_step<A, S>(
        &mut self,
        reveal: &Reveal,
        speed: u8,
        alarm: A,
        mut schedule_message: S,
    ) -> bool
    where
        A: FnOnce(u64) -> crate::AlarmMessage,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        match self.arm(reveal, speed) {
            Some((generation, delay)) => {
                schedule_message(alarm(generation), delay);
                true
            }
            None => false,
        }
    }

    /// Stops the reveal for an answer and captures where it stopped
    pub(crate) fn freeze(
        &mut self,
        reveal: &Reveal,
        automatic: bool,
    ) -> Result<BuzzSnapshot, TransitionError> {
        self.transition(Status::Answering)?;
        let snapshot = reveal.snapshot();
        tracing::debug!(index = snapshot.index, automatic, "buzzed");
        Ok(snapshot)
    }

    /// Whether an alarm for `generation` may advance the reveal
    pub(crate) fn accept_step(&mut self, generation: u64) -> bool {
        self.status == Status::Reading && self.timer.fire(generation)
    }

    /// Pops the next question, fetching synchronously when the queue is empty
    ///
    /// Returns `None` after moving to [`Status::Empty`] when no question
    /// could be found. A non-empty but low queue requests a background
    /// refill without waiting for it.
    pub(crate) fn next_question<Q, S: QuestionSource<Q>>(
        &mut self,
        queue: &mut PendingQueue<Q>,
        source: &mut S,
        config: &ReaderConfig,
    ) -> Result<Option<Q>, TransitionError> {
        let must_fetch = queue.is_empty();
        if must_fetch || self.status == Status::Empty {
            self.transition(Status::Fetching)?;
        }
        if must_fetch {
            queue.fetch(source, config);
        } else {
            queue.refill_if_low(source, config);
        }

        match queue.pop() {
            Some(question) => Ok(Some(question)),
            None => {
                self.transition(Status::Empty)?;
                Ok(None)
            }
        }
    }
}
