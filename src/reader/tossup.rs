//! Tossup reader
//!
//! Reads one tossup at a time: words are revealed on scheduled alarms until
//! the player buzzes or the question runs out, then submissions are judged
//! until a terminal verdict is scored and recorded.

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
    constants::answer_text::MAX_LENGTH,
    history::{History, TossupResult},
    judging::{AnswerSet, JudgeVerdict, Judgement, judge, parse},
    question::{Category, Tossup},
    scoring::tossup_score,
    session::Listener,
    source::{Filters, QuestionSource, Refill},
};

/// Messages sent to the listener as the tossup progresses
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// A new tossup started reading
    QuestionStarted {
        /// Category of the question
        category: Category,
        /// Subcategory of the question
        subcategory: String,
        /// Difficulty id
        difficulty: u8,
        /// Tournament the question was written for
        tournament: String,
        /// Number of words to reveal
        word_count: usize,
    },
    /// One more word is visible
    WordRevealed(BuzzSnapshot),
    /// The reveal stopped for an answer
    Buzzed {
        /// Reveal state at the buzz
        snapshot: BuzzSnapshot,
        /// Whether the buzz happened because the question ran out
        automatic: bool,
    },
    /// The answer was close to a promptable answer; another answer is expected
    Prompted {
        /// Similarity to the matched promptable answer
        similarity: f64,
    },
    /// The tossup has a result
    Judged(TossupResult),
    /// No question matched the filters
    QueueExhausted,
}

/// Messages the tossup reader schedules for itself
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
    /// No question is being read
    Waiting {
        /// Current status
        status: Status,
        /// Running score
        score: i64,
    },
    /// Words are being revealed
    Reading {
        /// Reveal state so far
        snapshot: BuzzSnapshot,
        /// Running score
        score: i64,
    },
    /// An answer is expected
    Answering {
        /// Reveal state at the buzz
        snapshot: BuzzSnapshot,
        /// Whether the last answer was prompted
        prompted: bool,
        /// Running score
        score: i64,
    },
    /// The tossup has a result
    Judged {
        /// The answer line
        answer: String,
        /// Reveal state at the buzz
        snapshot: BuzzSnapshot,
        /// Running score
        score: i64,
    },
}

#[derive(Debug, Clone)]
struct Current {
    question: Arc<Tossup>,
    answers: AnswerSet,
    reveal: Reveal,
    snapshot: Option<BuzzSnapshot>,
}

impl Current {
    fn new(question: Arc<Tossup>) -> Self {
        Self {
            answers: parse(question.answerline()),
            reveal: Reveal::new(question.words()),
            snapshot: None,
            question,
        }
    }

    fn frozen_snapshot(&self) -> BuzzSnapshot {
        self.snapshot
            .clone()
            .unwrap_or_else(|| self.reveal.snapshot())
    }
}

/// State machine reading tossups
#[derive(Debug, Clone)]
pub struct TossupReader {
    config: ReaderConfig,
    lifecycle: Lifecycle,
    queue: PendingQueue<Tossup>,
    current: Option<Current>,
}

impl TossupReader {
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
    pub fn queue(&self) -> &PendingQueue<Tossup> {
        &self.queue
    }

    /// The question being read or last judged
    pub fn question(&self) -> Option<&Tossup> {
        self.current.as_ref().map(|current| &*current.question)
    }

    /// Answers still available for the current question
    pub fn answers(&self) -> Option<&AnswerSet> {
        self.current.as_ref().map(|current| &current.answers)
    }

    /// Reveal state of the current question
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

    /// Starts reading the next tossup
    ///
    /// Fetches synchronously when nothing is queued and requests a
    /// background refill when the queue is running low. When no question is
    /// available the reader becomes [`Status::Empty`].
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
        Src: QuestionSource<Tossup>,
        L: Listener,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        self.lifecycle.require(
            "request the next tossup",
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
                word_count: current.reveal.words().len(),
            }
            .into(),
        );
        self.current = Some(current);
        self.schedule_step(listener, schedule_message)
    }

    /// Stops the reveal for an answer
    ///
    /// # Errors
    ///
    /// Fails unless the reader is reading.
    pub fn buzz<L: Listener>(&mut self, listener: &L) -> Result<BuzzSnapshot, Error> {
        self.lifecycle.require("buzz", &[Status::Reading])?;
        self.freeze(listener, false)
    }

    /// Judges an answer
    ///
    /// A prompt keeps the reader waiting for another answer. A correct or
    /// incorrect verdict is scored, recorded in `history`, and ends the
    /// tossup.
    ///
    /// # Errors
    ///
    /// Fails unless the reader is answering or prompting.
    pub fn submit<L: Listener>(
        &mut self,
        answer: &str,
        history: &mut History,
        listener: &L,
    ) -> Result<JudgeVerdict, Error> {
        const OPERATION: &str = "submit an answer";
        self.lifecycle
            .require(OPERATION, &[Status::Answering, Status::Prompting])?;
        let current = self
            .current
            .as_mut()
            .ok_or(TransitionError::NoQuestion { operation: OPERATION })?;

        let Judgement { verdict, remaining } = judge(&current.answers, answer);
        current.answers = remaining;

        match verdict.outcome() {
            None => {
                self.lifecycle.transition(Status::Prompting)?;
                listener.send_message(
                    &UpdateMessage::Prompted {
                        similarity: verdict.similarity(),
                    }
                    .into(),
                );
            }
            Some(outcome) => {
                let snapshot = current.frozen_snapshot();
                let score = tossup_score(outcome, &snapshot);
                let result = TossupResult::new(
                    Arc::clone(&current.question),
                    answer.chars().take(MAX_LENGTH).collect(),
                    verdict.clone(),
                    score,
                    self.config.tossup_values.points(score),
                    snapshot,
                );
                self.lifecycle.transition(Status::Judged)?;
                history.record(result.clone());
                listener.send_message(&UpdateMessage::Judged(result).into());
            }
        }

        Ok(verdict)
    }

    /// Handles a scheduled reveal step
    ///
    /// Steps scheduled before a buzz, before the last status change, or for
    /// an earlier question are ignored.
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
        let crate::AlarmMessage::Tossup(AlarmMessage::RevealWord { generation }) = message else {
            return Ok(());
        };
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        if !self.lifecycle.accept_step(*generation) {
            return Ok(());
        }

        current.reveal.advance();
        tracing::trace!(index = current.reveal.index(), "revealed word");
        listener.send_message(&UpdateMessage::WordRevealed(current.reveal.snapshot()).into());

        self.schedule_step(listener, schedule_message)
    }

    /// Appends a background refill delivered by the host
    ///
    /// Never touches the question being read.
    pub fn receive_refill(&mut self, refill: Refill<Tossup>) {
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
        Src: QuestionSource<Tossup>,
        L: Listener,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        match message {
            IncomingMessage::Next => self.request_next(source, listener, schedule_message),
            IncomingMessage::Buzz => self.buzz(listener).map(|_| ()),
            IncomingMessage::Answer(answer) => self.submit(&answer, history, listener).map(|_| ()),
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
            (Status::Reading, Some(current)) => SyncMessage::Reading {
                snapshot: current.reveal.snapshot(),
                score,
            },
            (status @ (Status::Answering | Status::Prompting), Some(current)) => {
                SyncMessage::Answering {
                    snapshot: current.frozen_snapshot(),
                    prompted: status == Status::Prompting,
                    score,
                }
            }
            (Status::Judged, Some(current)) => SyncMessage::Judged {
                answer: current.question.answerline().to_string(),
                snapshot: current.frozen_snapshot(),
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
                snapshot: snapshot.clone(),
                automatic,
            }
            .into(),
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        constants::{
            reading::MAX_SPEED,
            tossup::{BASE_POINTS, NEG_POINTS, POWER_POINTS},
        },
        question::tests::tossup,
        reader::tests::{Alarms, scheduler, take_alarm},
        scoring::TossupScore,
        session::tests::RecordingListener,
        source::{MemorySource, Order, SourceError},
    };

    const TEN_WORDS: &str = "This French emperor (*) was later exiled to Saint Helena.";

    fn napoleon() -> Tossup {
        tossup(
            TEN_WORDS,
            "Napoleon Bonaparte [accept Napoleon I; prompt on Bonaparte]",
        )
    }

    fn source(questions: Vec<Tossup>) -> MemorySource<Tossup> {
        MemorySource::new(questions, Order::Sequential).unwrap()
    }

    struct FailingSource;

    impl QuestionSource<Tossup> for FailingSource {
        fn fetch(&mut self, _request: &crate::source::Request) -> Result<Vec<Tossup>, SourceError> {
            Err(SourceError::Unavailable("offline".to_string()))
        }

        fn request_refill(&mut self, _request: crate::source::Request) {}
    }

    fn reader() -> TossupReader {
        TossupReader::new(ReaderConfig::default()).unwrap()
    }

    /// Delivers `count` reveal alarms in order
    fn reveal(reader: &mut TossupReader, alarms: &Alarms, listener: &RecordingListener, count: usize) {
        for _ in 0..count {
            let alarm = take_alarm(alarms);
            reader
                .receive_alarm(&alarm, listener, scheduler(alarms))
                .unwrap();
        }
    }

    #[test]
    fn test_question_has_ten_words() {
        assert_eq!(napoleon().words().len(), 10);
    }

    #[test]
    fn test_request_next_starts_reading() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();

        assert_eq!(reader.status(), Status::Reading);
        assert_eq!(reader.snapshot().unwrap().index, 0);
        assert_eq!(alarms.borrow().len(), 1);
        assert_eq!(listener.count_containing("QuestionStarted"), 1);
    }

    #[test]
    fn test_auto_buzz_incorrect_scores_zero() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reveal(&mut reader, &alarms, &listener, 10);

        assert_eq!(reader.status(), Status::Answering);
        assert!(alarms.borrow().is_empty());
        assert_eq!(listener.count_containing("WordRevealed"), 10);
        assert_eq!(listener.count_containing("\"automatic\":true"), 1);

        let verdict = reader.submit("wellington", &mut history, &listener).unwrap();
        assert_eq!(verdict.kind(), crate::judging::Verdict::Incorrect);
        assert_eq!(reader.status(), Status::Judged);

        let Some(crate::history::Record::Tossup(result)) = history.records().last() else {
            panic!("expected a tossup result");
        };
        assert_eq!(result.score(), TossupScore::Zero);
        assert_eq!(result.points(), 0);
        assert!(result.snapshot().at_end());
        assert_eq!(history.score(), 0);
    }

    #[test]
    fn test_power_buzz_correct() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reveal(&mut reader, &alarms, &listener, 2);
        let snapshot = reader.buzz(&listener).unwrap();
        assert!(snapshot.in_power);
        assert_eq!(snapshot.read_text, "This French");

        reader.submit("Napoleon", &mut history, &listener).unwrap();
        assert_eq!(history.score(), i64::from(POWER_POINTS));
        assert!(POWER_POINTS > BASE_POINTS);
        assert_eq!(history.tossup_scores()[TossupScore::Power], 1);
    }

    #[test]
    fn test_late_buzz_correct_scores_base() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reveal(&mut reader, &alarms, &listener, 5);
        reader.buzz(&listener).unwrap();
        reader.submit("napoleon i", &mut history, &listener).unwrap();
        assert_eq!(history.score(), i64::from(BASE_POINTS));
    }

    #[test]
    fn test_early_wrong_buzz_negs() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reveal(&mut reader, &alarms, &listener, 6);
        reader.buzz(&listener).unwrap();
        reader.submit("wellington", &mut history, &listener).unwrap();
        assert_eq!(history.score(), i64::from(NEG_POINTS));
    }

    #[test]
    fn test_prompt_then_judged() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reveal(&mut reader, &alarms, &listener, 4);
        reader.buzz(&listener).unwrap();

        let first = reader.submit("bonaparte", &mut history, &listener).unwrap();
        assert_eq!(first.kind(), crate::judging::Verdict::Prompt);
        assert_eq!(reader.status(), Status::Prompting);
        assert!(history.is_empty());
        assert!(reader.answers().unwrap().prompt().is_empty());

        let second = reader.submit("bonaparte", &mut history, &listener).unwrap();
        assert_eq!(second.kind(), crate::judging::Verdict::Incorrect);
        assert_eq!(reader.status(), Status::Judged);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_stale_alarm_after_buzz_is_ignored() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reveal(&mut reader, &alarms, &listener, 3);
        reader.buzz(&listener).unwrap();

        let stale = take_alarm(&alarms);
        reader
            .receive_alarm(&stale, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.status(), Status::Answering);
        assert_eq!(reader.snapshot().unwrap().index, 3);
        assert!(alarms.borrow().is_empty());
    }

    #[test]
    fn test_alarm_from_previous_question_is_ignored() {
        let mut reader = reader();
        let mut source = source(vec![napoleon(), napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        let old = take_alarm(&alarms);
        reader.buzz(&listener).unwrap();
        reader.submit("napoleon", &mut history, &listener).unwrap();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reader
            .receive_alarm(&old, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.snapshot().unwrap().index, 0);
        assert_eq!(alarms.borrow().len(), 1);
    }

    #[test]
    fn test_new_question_resets_index() {
        let mut reader = reader();
        let mut source = source(vec![napoleon(), napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reveal(&mut reader, &alarms, &listener, 7);
        reader.buzz(&listener).unwrap();
        reader.submit("napoleon", &mut history, &listener).unwrap();
        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.status(), Status::Reading);
        assert_eq!(reader.snapshot().unwrap().index, 0);
    }

    #[test]
    fn test_empty_source_becomes_empty() {
        let mut reader = reader();
        let mut source = source(Vec::new());
        let listener = RecordingListener::default();
        let alarms = Alarms::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.status(), Status::Empty);
        assert!(reader.question().is_none());
        assert_eq!(listener.count_containing("QueueExhausted"), 1);
    }

    #[test]
    fn test_fetch_failure_becomes_empty() {
        let mut reader = reader();
        let listener = RecordingListener::default();
        let alarms = Alarms::default();

        reader
            .request_next(&mut FailingSource, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.status(), Status::Empty);

        // retried only on the next explicit request
        reader
            .request_next(&mut FailingSource, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.status(), Status::Empty);
        assert!(alarms.borrow().is_empty());
    }

    #[test]
    fn test_low_queue_requests_refill_without_waiting() {
        let mut reader = reader();
        let mut source = MemorySource::new(vec![napoleon(), napoleon()], Order::Sequential).unwrap();
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.queue().len(), 1);
        reader.buzz(&listener).unwrap();
        reader.submit("napoleon", &mut history, &listener).unwrap();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.status(), Status::Reading);
        assert!(reader.queue().refill_in_flight());
        assert_eq!(source.pending_refills(), 1);

        let before = reader.snapshot();
        reader.receive_refill(source.poll_refill().unwrap());
        assert!(!reader.queue().refill_in_flight());
        assert_eq!(reader.snapshot(), before);
        assert_eq!(reader.status(), Status::Reading);
    }

    #[test]
    fn test_refill_requested_before_filter_change_is_dropped() {
        let mut reader = TossupReader::new(ReaderConfig {
            batch_size: 2,
            ..ReaderConfig::default()
        })
        .unwrap();
        let mut mercury = tossup("This planet is closest to the sun.", "Mercury");
        mercury.category = Category::Science;
        let mut source = source(vec![
            napoleon(),
            tossup(TEN_WORDS, "Wellington"),
            mercury,
        ]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reader.buzz(&listener).unwrap();
        reader.submit("napoleon", &mut history, &listener).unwrap();
        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        assert!(reader.queue().refill_in_flight());

        reader
            .set_filters(Filters {
                categories: vec![Category::History],
                ..Filters::default()
            })
            .unwrap();
        reader.receive_refill(source.poll_refill().unwrap());
        assert!(reader.queue().is_empty());

        reader.buzz(&listener).unwrap();
        reader.submit("wellington", &mut history, &listener).unwrap();
        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        let question = reader.question().unwrap();
        assert_eq!(question.category, Category::History);
        assert_eq!(question.answer, napoleon().answer);
        assert_eq!(reader.queue().len(), 1);
    }

    #[test]
    fn test_wrong_status_operations() {
        let mut reader = reader();
        let listener = RecordingListener::default();
        let mut history = History::default();

        assert!(matches!(
            reader.buzz(&listener),
            Err(Error::Transition(TransitionError::WrongStatus { .. }))
        ));
        assert!(matches!(
            reader.submit("napoleon", &mut history, &listener),
            Err(Error::Transition(TransitionError::WrongStatus { .. }))
        ));
        assert_eq!(reader.status(), Status::Idle);
    }

    #[test]
    fn test_buzz_twice_rejected() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        reader.buzz(&listener).unwrap();
        assert!(reader.buzz(&listener).is_err());
    }

    #[test]
    fn test_empty_question_buzzes_immediately() {
        let mut reader = reader();
        let mut source = source(vec![tossup("", "Napoleon")]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.status(), Status::Answering);
        assert!(alarms.borrow().is_empty());
    }

    #[test]
    fn test_reading_speed_applies_to_next_step() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        let slow = alarms.borrow()[0].1;
        reader.set_reading_speed(100);
        assert_eq!(alarms.borrow()[0].1, slow);

        reveal(&mut reader, &alarms, &listener, 1);
        let fast = alarms.borrow()[0].1;
        // "French" at full speed is faster than "This" at half speed
        assert!(fast < slow);
        reader.set_reading_speed(250);
        assert_eq!(reader.config().reading_speed, MAX_SPEED);
    }

    #[test]
    fn test_state_message_follows_status() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        assert!(matches!(
            reader.state_message(&history),
            SyncMessage::Waiting {
                status: Status::Idle,
                ..
            }
        ));
        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        assert!(matches!(reader.state_message(&history), SyncMessage::Reading { .. }));
        reader.buzz(&listener).unwrap();
        reader.submit("bonaparte", &mut history, &listener).unwrap();
        assert!(matches!(
            reader.state_message(&history),
            SyncMessage::Answering { prompted: true, .. }
        ));
        reader.submit("napoleon", &mut history, &listener).unwrap();
        let SyncMessage::Judged { answer, score, .. } = reader.state_message(&history) else {
            panic!("expected a judged state");
        };
        assert!(answer.starts_with("Napoleon Bonaparte"));
        assert_eq!(score, i64::from(POWER_POINTS));
    }

    #[test]
    fn test_receive_message_dispatch() {
        let mut reader = reader();
        let mut source = source(vec![napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();
        let mut history = History::default();

        for message in [
            IncomingMessage::ReadingSpeed(70),
            IncomingMessage::Next,
            IncomingMessage::Buzz,
            IncomingMessage::Answer("Napoleon".to_string()),
        ] {
            reader
                .receive_message(message, &mut source, &mut history, &listener, scheduler(&alarms))
                .unwrap();
        }
        assert_eq!(reader.config().reading_speed, 70);
        assert_eq!(reader.status(), Status::Judged);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_set_filters_clears_queue() {
        let mut reader = reader();
        let mut source = source(vec![napoleon(), napoleon(), napoleon()]);
        let listener = RecordingListener::default();
        let alarms = Alarms::default();

        reader
            .request_next(&mut source, &listener, scheduler(&alarms))
            .unwrap();
        assert_eq!(reader.queue().len(), 2);
        reader
            .set_filters(Filters {
                difficulties: vec![5],
                ..Filters::default()
            })
            .unwrap();
        assert!(reader.queue().is_empty());
        assert!(
            reader
                .set_filters(Filters {
                    difficulties: vec![11],
                    ..Filters::default()
                })
                .is_err()
        );
    }
}
