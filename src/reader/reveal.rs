//! Progressive reveal of a question's words

use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::question::Word;

/// Position of one reveal pass over a question
///
/// `index` counts the visible words. It only grows and never exceeds the
/// word count; a new pass starts from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    words: Arc<[Word]>,
    index: usize,
}

/// The state of the reveal at the moment of a buzz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzSnapshot {
    /// Number of words visible at the buzz
    pub index: usize,
    /// Whether the last visible word was inside the power span
    pub in_power: bool,
    /// The visible words joined by spaces
    pub read_text: String,
    /// Every word of the question
    pub words: Arc<[Word]>,
}

impl BuzzSnapshot {
    /// Whether the whole question was visible at the buzz
    pub fn at_end(&self) -> bool {
        self.index >= self.words.len()
    }
}

impl Reveal {
    /// Starts a reveal pass with no visible words
    pub fn new(words: Vec<Word>) -> Self {
        Self {
            words: words.into(),
            index: 0,
        }
    }

    /// Number of visible words
    pub fn index(&self) -> usize {
        self.index
    }

    /// Every word of the question
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// The word the next step will reveal
    pub fn next_word(&self) -> Option<&Word> {
        self.words.get(self.index)
    }

    /// The most recently revealed word
    pub fn last_revealed(&self) -> Option<&Word> {
        self.index.checked_sub(1).and_then(|last| self.words.get(last))
    }

    /// Whether every word is visible
    pub fn at_end(&self) -> bool {
        self.index >= self.words.len()
    }

    /// Reveals one more word, returning whether anything changed
    pub fn advance(&mut self) -> bool {
        if self.at_end() {
            false
        } else {
            self.index += 1;
            true
        }
    }

    /// Captures the current position
    ///
    /// A buzz before the first word counts as inside the power span when
    /// the question has one.
    pub fn snapshot(&self) -> BuzzSnapshot {
        BuzzSnapshot {
            index: self.index,
            in_power: self
                .words
                .get(self.index.saturating_sub(1))
                .is_some_and(|word| word.in_power),
            read_text: self.words[..self.index]
                .iter()
                .map(|word| word.text.as_str())
                .join(" "),
            words: Arc::clone(&self.words),
        }
    }
}
