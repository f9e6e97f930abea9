//! Result history and practice statistics
//!
//! Results are appended once and never changed. The history keeps a running
//! score and per-category statistics next to the records; those are caches
//! and are rebuilt from the records when a history is deserialized.

use std::{fmt::Display, str::FromStr, sync::Arc};

use enum_map::EnumMap;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;
use web_time::SystemTime;

use crate::{
    TruncatedVec,
    constants::history::RECENT_LIMIT,
    judging::{JudgeVerdict, Outcome},
    question::{Bonus, Category, Tossup},
    reader::reveal::BuzzSnapshot,
    scoring::TossupScore,
};

/// A unique identifier for a result
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random result ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The finished attempt at a tossup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TossupResult {
    id: Id,
    recorded_at: SystemTime,
    question: Arc<Tossup>,
    submission: String,
    verdict: JudgeVerdict,
    score: TossupScore,
    points: i32,
    snapshot: BuzzSnapshot,
}

impl TossupResult {
    pub(crate) fn new(
        question: Arc<Tossup>,
        submission: String,
        verdict: JudgeVerdict,
        score: TossupScore,
        points: i32,
        snapshot: BuzzSnapshot,
    ) -> Self {
        Self {
            id: Id::new(),
            recorded_at: SystemTime::now(),
            question,
            submission,
            verdict,
            score,
            points,
            snapshot,
        }
    }

    /// Unique id of this result
    pub fn id(&self) -> Id {
        self.id
    }

    /// When the result was finalized
    pub fn recorded_at(&self) -> SystemTime {
        self.recorded_at
    }

    /// The question that was answered
    pub fn question(&self) -> &Tossup {
        &self.question
    }

    /// The final submission
    pub fn submission(&self) -> &str {
        &self.submission
    }

    /// The terminal verdict
    pub fn verdict(&self) -> &JudgeVerdict {
        &self.verdict
    }

    /// How the attempt was scored
    pub fn score(&self) -> TossupScore {
        self.score
    }

    /// Points awarded
    pub fn points(&self) -> i32 {
        self.points
    }

    /// Reveal state at the buzz
    pub fn snapshot(&self) -> &BuzzSnapshot {
        &self.snapshot
    }
}

/// The finished attempt at one bonus part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusPart {
    /// The final submission
    pub submission: String,
    /// The terminal verdict
    pub verdict: JudgeVerdict,
    /// Reveal state at the buzz
    pub snapshot: BuzzSnapshot,
}

impl BonusPart {
    /// Whether the part was answered correctly
    pub fn is_correct(&self) -> bool {
        self.verdict.outcome() == Some(Outcome::Correct)
    }
}

/// The finished attempt at a bonus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusResult {
    id: Id,
    recorded_at: SystemTime,
    question: Arc<Bonus>,
    parts: Vec<BonusPart>,
    points: u32,
}

impl BonusResult {
    pub(crate) fn new(question: Arc<Bonus>, parts: Vec<BonusPart>, points: u32) -> Self {
        Self {
            id: Id::new(),
            recorded_at: SystemTime::now(),
            question,
            parts,
            points,
        }
    }

    /// Unique id of this result
    pub fn id(&self) -> Id {
        self.id
    }

    /// When the result was finalized
    pub fn recorded_at(&self) -> SystemTime {
        self.recorded_at
    }

    /// The question that was answered
    pub fn question(&self) -> &Bonus {
        &self.question
    }

    /// Every part in reading order
    pub fn parts(&self) -> &[BonusPart] {
        &self.parts
    }

    /// Number of parts answered correctly
    pub fn correct_parts(&self) -> usize {
        self.parts.iter().filter(|part| part.is_correct()).count()
    }

    /// Points awarded
    pub fn points(&self) -> u32 {
        self.points
    }
}

/// One entry of the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
pub enum Record {
    /// A finished tossup
    Tossup(TossupResult),
    /// A finished bonus
    Bonus(BonusResult),
}

impl Record {
    /// Unique id of the result
    pub fn id(&self) -> Id {
        match self {
            Self::Tossup(result) => result.id(),
            Self::Bonus(result) => result.id(),
        }
    }

    /// Signed points awarded
    pub fn points(&self) -> i64 {
        match self {
            Self::Tossup(result) => i64::from(result.points()),
            Self::Bonus(result) => i64::from(result.points()),
        }
    }

    /// Category of the question
    pub fn category(&self) -> Category {
        match self {
            Self::Tossup(result) => result.question().category,
            Self::Bonus(result) => result.question().category,
        }
    }
}

/// Statistics of one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    /// Tossups heard
    pub tossups: usize,
    /// Points earned on tossups
    pub tossup_points: i64,
    /// Tossups answered correctly
    pub tossups_correct: usize,
    /// Bonuses heard
    pub bonuses: usize,
    /// Points earned on bonuses
    pub bonus_points: u64,
}

impl CategoryStats {
    /// Average tossup points per tossup heard
    pub fn points_per_tossup(&self) -> f64 {
        if self.tossups == 0 {
            0.0
        } else {
            self.tossup_points as f64 / self.tossups as f64
        }
    }

    /// Average bonus points per bonus heard
    pub fn points_per_bonus(&self) -> f64 {
        if self.bonuses == 0 {
            0.0
        } else {
            self.bonus_points as f64 / self.bonuses as f64
        }
    }

    fn add(&mut self, record: &Record) {
        match record {
            Record::Tossup(result) => {
                self.tossups += 1;
                self.tossup_points += i64::from(result.points());
                if result.verdict().outcome() == Some(Outcome::Correct) {
                    self.tossups_correct += 1;
                }
            }
            Record::Bonus(result) => {
                self.bonuses += 1;
                self.bonus_points += u64::from(result.points());
            }
        }
    }
}

/// Serialization helper for [`History`]
#[derive(Deserialize)]
struct HistorySerde {
    records: Vec<Record>,
}

/// Append-only record of finished questions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "HistorySerde")]
pub struct History {
    records: Vec<Record>,

    #[serde(skip)]
    score: i64,
    #[serde(skip)]
    tossup_scores: EnumMap<TossupScore, usize>,
    #[serde(skip)]
    categories: EnumMap<Category, CategoryStats>,
}

impl From<HistorySerde> for History {
    fn from(serde: HistorySerde) -> Self {
        let mut history = Self::default();
        for record in serde.records {
            history.record(record);
        }
        history
    }
}

impl History {
    /// Appends a finished result and updates the statistics
    pub fn record<R: Into<Record>>(&mut self, record: R) {
        let record = record.into();

        self.score += record.points();
        if let Record::Tossup(result) = &record {
            self.tossup_scores[result.score()] += 1;
        }
        self.categories[record.category()].add(&record);

        tracing::info!(
            id = %record.id(),
            points = record.points(),
            score = self.score,
            "recorded result"
        );
        self.records.push(record);
    }

    /// Every record in the order it was finished
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Running score over every record
    pub fn score(&self) -> i64 {
        self.score
    }

    /// How many tossups ended with each score
    pub fn tossup_scores(&self) -> &EnumMap<TossupScore, usize> {
        &self.tossup_scores
    }

    /// Statistics of one category
    pub fn category(&self, category: Category) -> CategoryStats {
        self.categories[category]
    }

    /// Statistics of every category that has been heard
    pub fn categories(&self) -> impl Iterator<Item = (Category, CategoryStats)> + '_ {
        self.categories
            .iter()
            .filter(|(_, stats)| stats.tossups + stats.bonuses > 0)
            .map(|(category, stats)| (category, *stats))
    }

    /// Overall tossup and bonus statistics
    pub fn totals(&self) -> CategoryStats {
        let mut totals = CategoryStats::default();
        for record in &self.records {
            totals.add(record);
        }
        totals
    }

    /// The most recent records, newest first
    pub fn recent(&self, limit: usize) -> TruncatedVec<Record> {
        TruncatedVec::new(self.records.iter().rev().cloned(), limit, self.records.len())
    }

    /// The default recent results view
    pub fn recent_default(&self) -> TruncatedVec<Record> {
        self.recent(RECENT_LIMIT)
    }
}
