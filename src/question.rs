//! Question records and annotated words
//!
//! Questions arrive from a [`crate::source::QuestionSource`] and are never
//! modified afterwards; the readers share them behind an `Arc`.

use enum_map::Enum;
use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::constants::{bonus::PART_COUNT, filters, tossup::POWER_MARKER};

/// The standard quiz bowl categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize)]
pub enum Category {
    /// Novels, poetry, drama, and literary criticism
    Literature,
    /// World, European, and American history
    History,
    /// Biology, chemistry, physics, math, and other sciences
    Science,
    /// Painting, sculpture, music, and other fine arts
    #[serde(rename = "Fine Arts")]
    FineArts,
    /// World religions and sacred texts
    Religion,
    /// World mythologies
    Mythology,
    /// Philosophers and philosophical movements
    Philosophy,
    /// Economics, psychology, linguistics, and the like
    #[serde(rename = "Social Science")]
    SocialScience,
    /// Recent news
    #[serde(rename = "Current Events")]
    CurrentEvents,
    /// Physical and political geography
    Geography,
    /// Anything academic that fits nowhere else
    #[serde(rename = "Other Academic")]
    OtherAcademic,
    /// Popular culture
    Trash,
}

/// Metadata shared by tossups and bonuses, used to filter question pools
pub trait Question {
    /// Category of the question
    fn category(&self) -> Category;
    /// Subcategory of the question
    fn subcategory(&self) -> &str;
    /// Difficulty id
    fn difficulty(&self) -> u8;
    /// Tournament the question was written for
    fn tournament(&self) -> &str;
    /// All searchable text: the question and its answer lines
    fn searchable_text(&self) -> String;
}

/// A single-answer question read progressively until a buzz
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Tossup {
    /// Identifier assigned by the question source
    #[garde(skip)]
    #[serde(default)]
    pub id: Option<String>,
    /// Plain question text, with `(*)` marking the end of the power span
    #[garde(skip)]
    pub question: String,
    /// Raw answer line
    #[garde(skip)]
    pub answer: String,
    /// Question text with markup
    #[garde(skip)]
    #[serde(default)]
    pub formatted_question: Option<String>,
    /// Answer line with markup (bold for required, underline for promptable)
    #[garde(skip)]
    #[serde(default)]
    pub formatted_answer: Option<String>,
    /// Category of the question
    #[garde(skip)]
    pub category: Category,
    /// Subcategory of the question
    #[garde(skip)]
    #[serde(default)]
    pub subcategory: String,
    /// Difficulty id
    #[garde(range(min = filters::MIN_DIFFICULTY, max = filters::MAX_DIFFICULTY))]
    pub difficulty: u8,
    /// Tournament the question was written for
    #[garde(skip)]
    #[serde(default)]
    pub tournament: String,
}

impl Tossup {
    /// The answer line the judge should parse, preferring the formatted one
    pub fn answerline(&self) -> &str {
        self.formatted_answer.as_deref().unwrap_or(&self.answer)
    }

    /// Splits the question text into annotated words
    pub fn words(&self) -> Vec<Word> {
        Word::split(&self.question)
    }
}

/// A three-part question scored by the number of parts answered correctly
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Bonus {
    /// Identifier assigned by the question source
    #[garde(skip)]
    #[serde(default)]
    pub id: Option<String>,
    /// Text read before the first part
    #[garde(skip)]
    pub leadin: String,
    /// Text of each part
    #[garde(length(equal = PART_COUNT))]
    pub parts: Vec<String>,
    /// Raw answer line of each part
    #[garde(length(equal = PART_COUNT))]
    pub answers: Vec<String>,
    /// Answer lines with markup, one per part
    #[garde(length(equal = PART_COUNT))]
    #[serde(default)]
    pub formatted_answers: Option<Vec<String>>,
    /// Category of the question
    #[garde(skip)]
    pub category: Category,
    /// Subcategory of the question
    #[garde(skip)]
    #[serde(default)]
    pub subcategory: String,
    /// Difficulty id
    #[garde(range(min = filters::MIN_DIFFICULTY, max = filters::MAX_DIFFICULTY))]
    pub difficulty: u8,
    /// Tournament the question was written for
    #[garde(skip)]
    #[serde(default)]
    pub tournament: String,
}

impl Bonus {
    /// The answer line of a part, preferring the formatted one
    pub fn answerline(&self, part: usize) -> &str {
        self.formatted_answers
            .as_ref()
            .and_then(|answers| answers.get(part))
            .or_else(|| self.answers.get(part))
            .map_or("", String::as_str)
    }

    /// Splits a part into annotated words; the first part is read after the leadin
    pub fn words(&self, part: usize) -> Vec<Word> {
        let text = self.parts.get(part).map_or("", String::as_str);
        if part == 0 {
            Word::split(&format!("{} {text}", self.leadin))
        } else {
            Word::split(text)
        }
    }
}

impl Question for Tossup {
    fn category(&self) -> Category {
        self.category
    }

    fn subcategory(&self) -> &str {
        &self.subcategory
    }

    fn difficulty(&self) -> u8 {
        self.difficulty
    }

    fn tournament(&self) -> &str {
        &self.tournament
    }

    fn searchable_text(&self) -> String {
        format!("{} {}", self.question, self.answer)
    }
}

impl Question for Bonus {
    fn category(&self) -> Category {
        self.category
    }

    fn subcategory(&self) -> &str {
        &self.subcategory
    }

    fn difficulty(&self) -> u8 {
        self.difficulty
    }

    fn tournament(&self) -> &str {
        &self.tournament
    }

    fn searchable_text(&self) -> String {
        std::iter::once(&self.leadin)
            .chain(&self.parts)
            .chain(&self.answers)
            .join(" ")
    }
}

/// One token of question text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// The token as written
    pub text: String,
    /// Whether the token lies in the power span
    pub in_power: bool,
}

impl Word {
    /// Splits question text on whitespace and marks the power span
    ///
    /// The power marker `(*)` ends the power span: it and every word before
    /// it are in power. Text without a marker has no power span. A marker
    /// glued to a word is split off into its own token.
    pub fn split(text: &str) -> Vec<Self> {
        let spaced = text.replace(POWER_MARKER, &format!(" {POWER_MARKER} "));
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        let power_end = tokens.iter().position(|token| *token == POWER_MARKER);

        tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| Self {
                text: token.to_string(),
                in_power: power_end.is_some_and(|end| index <= end),
            })
            .collect()
    }

    /// Whether this token is the power marker
    pub fn is_power_marker(&self) -> bool {
        self.text == POWER_MARKER
    }
}
