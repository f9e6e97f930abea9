//! Bonus reader
//!
//! A bonus is read part by part with the same reveal machinery as a tossup.
//! The leadin is read together with the first part. Every part ends with a
//! terminal verdict; after the last one the bonus is scored by the number
//! of correct parts.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use super::{
    Error, Lifecycle, Status, TransitionError,
    queue::PendingQueue,
    reveal::{BuzzSnapshot, Reveal},
};
use crate::{
    IncomingMessage,
    config::ReaderConfig,
    constants::{answer_text::MAX_LENGTH, bonus::PART_COUNT},
    history::{BonusPart, BonusResult, History},
    judging::{AnswerSet, JudgeVerdict, Judgement, judge, parse},
    question::{Bonus, Category},
    scoring::bonus_points,
    session::Listener,
    source::{Filters, QuestionSource, Refill},
};

/// Messages sent to the listener as the bonus progresses
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// A new bonus started reading
    QuestionStarted {
        /// Category of the question
        category: Category,
        /// Subcategory of the question
        subcategory: String,
        /// Difficulty id
        difficulty: u8,
        /// Tournament the question was written for
        tournament: String,
    },
    /// A part started reading
    PartStarted {
        /// Index of the part (0-indexing)
        part: usize,
        /// Number of words to reveal
        word_count: usize,
    },
    /// One more word is visible
    WordRevealed(BuzzSnapshot),
    /// The reveal stopped for an answer
    Buzzed {
        /// Index of the part
        part: usize,
        /// Reveal state at the buzz
        snapshot: BuzzSnapshot,
        /// Whether the buzz happened because the part ran out
        automatic: bool,
    },
    /// The answer was close to a promptable answer; another answer is expected
    Prompted {
        /// Index of the part
        part: usize,
        /// Similarity to the matched promptable answer
        similarity: f64,
    },
    /// A part has a terminal verdict
    PartJudged {
        /// Index of the part
        part: usize,
        /// The verdict
        verdict: JudgeVerdict,
        /// The answer line of the part
        answer: String,
    },
    /// The bonus has a result
    Judged(BonusResult),
    /// No question matched the filters
    QueueExhausted,
}

/// Messages the bonus reader schedules for itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Reveals the next word if the reveal step is still current
    RevealWord {
        /// Timer generation the step was scheduled with
        generation: u64,
    },
}

/// Messages describing the full reader state for a late listener
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// No bonus is being read
    Waiting {
        /// Current status
        status: Status,
        /// Running score
        score: i64,
    },
    /// A part is being read or answered
    Part {
        /// Current status
        status: Status,
        /// Index of the part
        part: usize,
        /// Verdicts of the finished parts
        finished: Vec<JudgeVerdict>,
        /// Reveal state of the part
        snapshot: BuzzSnapshot,
        /// Running score
        score: i64,
    },
    /// The bonus has a result
    Judged {
        /// Answer lines of every part
        answers: Vec<String>,
        /// Verdicts of every part
        finished: Vec<JudgeVerdict>,
        /// Running score
        score: i64,
    },
}

#[derive(Debug, Clone)]
struct Current {
    question: Arc<Bonus>,
    part: usize,
    answers: AnswerSet,
    reveal: Reveal,
    snapshot: Option<BuzzSnapshot>,
    finished: Vec<BonusPart>,
}

impl Current {
    fn new(question: Arc<Bonus>) -> Self {
        Self {
            part: 0,
            answers: parse(question.answerline(0)),
            reveal: Reveal::new(question.words(0)),
            snapshot: None,
            finished: Vec::with_capacity(PART_COUNT),
            question,
        }
    }

    fn start_part(&mut self, part: usize) {
        self.part = part;
        self.answers = parse(self.question.answerline(part));
        self.reveal = Reveal::new(self.question.words(part));
        self.snapshot = None;
    }

    fn frozen_snapshot(&self) -> BuzzSnapshot {
        self.snapshot
            .clone()
            .unwrap_or_else(|| self.reveal.snapshot())
    }

    fn verdicts(&self) -> Vec<JudgeVerdict> {
        self.finished.iter().map(|part| part.verdict.clone()).collect()
    }
}

/// State machine reading bonuses
#[derive(Debug, Clone)]
pub struct BonusReader {
    config: ReaderConfig,
    lifecycle: Lifecycle,
    queue: PendingQueue<Bonus>,
    current: Option<Current>,
}

impl BonusReader {
    /// Creates an idle reader
    ///
    /// # Errors
    ///
    /// Returns the validation report when `config` is invalid.
    pub fn new(config: ReaderConfig) -> Result<Self, garde::Report> {
        garde::Validate::validate(&config)?;
        Ok(Self {
            config,
            lifecycle: Lifecycle::default(),
            queue: PendingQueue::default(),
            current: None,
        })
    }

    /// Current status
    pub fn status(&self) -> Status {
        self.lifecycle.status()
    }

    /// Current configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Questions waiting to be read
    pub fn queue(&self) -> &PendingQueue<Bonus> {
        &self.queue
    }

    /// The bonus being read or last judged
    pub fn question(&self) -> Option<&Bonus> {
        self.current.as_ref().map(|current| &*current.question)
    }

    /// Index of the part being read or answered
    pub fn part(&self) -> Option<usize> {
        self.current.as_ref().map(|current| current.part)
    }

    /// Reveal state of the current part
    pub fn snapshot(&self) -> Option<BuzzSnapshot> {
        self.current.as_ref().map(|current| current.reveal.snapshot())
    }

    /// Changes the reading speed; the next scheduled word uses it
    pub fn set_reading_speed(&mut self, speed: u8) {
        self.config.set_reading_speed(speed);
    }

    /// Replaces the filters and drops questions fetched with the old ones
    ///
    /// # Errors
    ///
    /// Returns the validation report when `filters` are invalid.
    pub fn set_filters(&mut self, filters: Filters) -> Result<(), garde::Report> {
        self.config.set_filters(filters)?;
        self.queue.clear();
        Ok(())
    }

    /// Starts reading the next bonus
    ///
    /// # Errors
    ///
    /// Fails unless the reader is idle, judged, or empty.
    pub fn request_next<Src, L, S>(
        &mut self,
        source: &mut Src,
        listener: &L,
        schedule_message: S,
    ) -> Result<(), Error>
    where
        Src: QuestionSource<Bonus>,
        L: Listener,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        self.lifecycle.require(
            "request the next bonus",
            &[Status::Idle, Status::Judged, Status::Empty],
        )?;

        let Some(question) = self
            .lifecycle
            .next_question(&mut self.queue, source, &self.config)?
        else {
            self.current = None;
            listener.send_message(&UpdateMessage::QueueExhausted.into());
            return Ok(());
        };

        self.lifecycle.transition(Status::Reading)?;
        let current = Current::new(Arc::new(question));
        listener.send_message(
            &UpdateMessage::QuestionStarted {
                category: current.question.category,
                subcategory: current.question.subcategory.clone(),
                difficulty: current.question.difficulty,
                tournament: current.question.tournament.clone(),
            }
            .into(),
        );
        listener.send_message(
            &UpdateMessage::PartStarted {
                part: 0,
                word_count: current.reveal.words().len(),
            }
            .into(),
        );
        self.current = Some(current);
        self.schedule_step(listener, schedule_message)
    }

    /// Stops the reveal of the current part for an answer
    ///
    /// # Errors
    ///
    /// Fails unless the reader is reading.
    pub fn buzz<L: Listener>(&mut self, listener: &L) -> Result<BuzzSnapshot, Error> {
        self.lifecycle.require("buzz", &[Status::Reading])?;
        self.freeze(listener, false)
    }

    /// Judges an answer to the current part
    ///
    /// A prompt keeps the reader on the part. A terminal verdict finishes
    /// the part and starts reading the next one; after the last part the
    /// bonus is scored and recorded in `history`.
    ///
    /// # Errors
    ///
    /// Fails unless the reader is answering or prompting.
    pub fn submit<L, S>(
        &mut self,
        answer: &str,
        history: &mut History,
        listener: &L,
        schedule_message: S,
    ) -> Result<JudgeVerdict, Error>
    where
        L: Listener,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        const OPERATION: &str = "submit an answer";
        self.lifecycle
            .require(OPERATION, &[Status::Answering, Status::Prompting])?;
        let current = self
            .current
            .as_mut()
            .ok_or(TransitionError::NoQuestion { operation: OPERATION })?;

        let Judgement { verdict, remaining } = judge(&current.answers, answer);
        current.answers = remaining;
        let part = current.part;

        if verdict.outcome().is_none() {
            self.lifecycle.transition(Status::Prompting)?;
            listener.send_message(
                &UpdateMessage::Prompted {
                    part,
                    similarity: verdict.similarity(),
                }
                .into(),
            );
            return Ok(verdict);
        }

        current.finished.push(BonusPart {
            submission: answer.chars().take(MAX_LENGTH).collect(),
            verdict: verdict.clone(),
            snapshot: current.frozen_snapshot(),
        });
        listener.send_message(
            &UpdateMessage::PartJudged {
                part,
                verdict: verdict.clone(),
                answer: current.question.answerline(part).to_string(),
            }
            .into(),
        );

        if part + 1 < PART_COUNT {
            self.lifecycle.transition(Status::Reading)?;
            current.start_part(part + 1);
            listener.send_message(
                &UpdateMessage::PartStarted {
                    part: part + 1,
                    word_count: current.reveal.words().len(),
                }
                .into(),
            );
            self.schedule_step(listener, schedule_message)?;
        } else {
            let correct = current.finished.iter().filter(|part| part.is_correct()).count();
            let result = BonusResult::new(
                Arc::clone(&current.question),
                current.finished.clone(),
                bonus_points(correct)?,
            );
            self.lifecycle.transition(Status::Judged)?;
            history.record(result.clone());
            listener.send_message(&UpdateMessage::Judged(result).into());
        }

        Ok(verdict)
    }

    /// Handles a scheduled reveal step
    ///
    /// Steps scheduled before a buzz, before the last status change, or for
    /// an earlier part are ignored.
    ///
    /// # Errors
    ///
    /// Only fails if revealing the last word cannot move the reader to
    /// answering, which the transition table always allows.
    pub fn receive_alarm<L, S>(
        &mut self,
        message: &crate::AlarmMessage,
        listener: &L,
        schedule_message: S,
    ) -> Result<(), Error>
    where
        L: Listener,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let crate::AlarmMessage::Bonus(AlarmMessage::RevealWord { generation }) = message else {
            return Ok(());
        };
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        if !self.lifecycle.accept_step(*generation) {
            return Ok(());
        }

        current.reveal.advance();
        tracing::trace!(
            part = current.part,
            index = current.reveal.index(),
            "revealed word"
        );
        listener.send_message(&UpdateMessage::WordRevealed(current.reveal.snapshot()).into());

        self.schedule_step(listener, schedule_message)
    }

    /// Appends a background refill delivered by the host
    pub fn receive_refill(&mut self, refill: Refill<Bonus>) {
        self.queue.receive_refill(refill);
    }

    /// Dispatches a command from the display layer
    ///
    /// # Errors
    ///
    /// Returns the error of the dispatched operation.
    pub fn receive_message<Src, L, S>(
        &mut self,
        message: IncomingMessage,
        source: &mut Src,
        history: &mut History,
        listener: &L,
        schedule_message: S,
    ) -> Result<(), Error>
    where
        Src: QuestionSource<Bonus>,
        L: Listener,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        match message {
            IncomingMessage::Next => self.request_next(source, listener, schedule_message),
            IncomingMessage::Buzz => self.buzz(listener).map(|_| ()),
            IncomingMessage::Answer(answer) => self
                .submit(&answer, history, listener, schedule_message)
                .map(|_| ()),
            IncomingMessage::ReadingSpeed(speed) => {
                self.set_reading_speed(speed);
                Ok(())
            }
        }
    }

    /// Describes the whole reader state for a listener that just attached
    pub fn state_message(&self, history: &History) -> SyncMessage {
        let score = history.score();
        match (self.status(), &self.current) {
            (status @ (Status::Reading | Status::Answering | Status::Prompting), Some(current)) => {
                SyncMessage::Part {
                    status,
                    part: current.part,
                    finished: current.verdicts(),
                    snapshot: current.frozen_snapshot(),
                    score,
                }
            }
            (Status::Judged, Some(current)) => SyncMessage::Judged {
                answers: (0..PART_COUNT)
                    .map(|part| current.question.answerline(part).to_string())
                    .collect(),
                finished: current.verdicts(),
                score,
            },
            (status, _) => SyncMessage::Waiting { status, score },
        }
    }

    fn schedule_step<L, S>(&mut self, listener: &L, schedule_message: S) -> Result<(), Error>
    where
        L: Listener,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let Some(current) = self.current.as_ref() else {
            return Ok(());
        };

        let scheduled = self.lifecycle.schedule_step(
            &current.reveal,
            self.config.reading_speed,
            |generation| AlarmMessage::RevealWord { generation }.into(),
            schedule_message,
        );
        if scheduled {
            Ok(())
        } else {
            self.freeze(listener, true).map(|_| ())
        }
    }

    fn freeze<L: Listener>(&mut self, listener: &L, automatic: bool) -> Result<BuzzSnapshot, Error> {
        let current = self
            .current
            .as_mut()
            .ok_or(TransitionError::NoQuestion { operation: "buzz" })?;
        let snapshot = self.lifecycle.freeze(&current.reveal, automatic)?;
        current.snapshot = Some(snapshot.clone());
        listener.send_message(
            &UpdateMessage::Buzzed {
                part: current.part,
                snapshot: snapshot.clone(),
                automatic,
            }
            .into(),
        );
        Ok(snapshot)
    }
}
