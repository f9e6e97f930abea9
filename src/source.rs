//! Question sources
//!
//! The readers never talk to the network. They ask a [`QuestionSource`] for
//! batches, either synchronously when the pending queue is empty or as a
//! background refill whose batch the host hands back later.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    constants::filters::*,
    judging::normalize,
    question::{Category, Question},
};

/// Which questions a reader wants
///
/// Empty lists and empty strings place no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Filters {
    /// Allowed categories
    #[garde(skip)]
    pub categories: Vec<Category>,
    /// Allowed subcategories, compared case-insensitively
    #[garde(length(max = MAX_SUBCATEGORY_COUNT), inner(length(chars, max = MAX_QUERY_LENGTH)))]
    pub subcategories: Vec<String>,
    /// Allowed difficulty ids
    #[garde(inner(range(min = MIN_DIFFICULTY, max = MAX_DIFFICULTY)))]
    pub difficulties: Vec<u8>,
    /// Free text that must appear in the question or its answers
    #[garde(length(chars, max = MAX_QUERY_LENGTH))]
    pub query: String,
    /// Tournament the question must come from, compared case-insensitively
    #[garde(length(chars, max = MAX_QUERY_LENGTH))]
    pub tournament: String,
}

impl Filters {
    /// Whether a question passes every filter
    pub fn matches<Q: Question>(&self, question: &Q) -> bool {
        let query = normalize(&self.query);

        (self.categories.is_empty() || self.categories.contains(&question.category()))
            && (self.subcategories.is_empty()
                || self
                    .subcategories
                    .iter()
                    .any(|subcategory| subcategory.eq_ignore_ascii_case(question.subcategory())))
            && (self.difficulties.is_empty() || self.difficulties.contains(&question.difficulty()))
            && (self.tournament.is_empty()
                || self.tournament.eq_ignore_ascii_case(question.tournament()))
            && (query.is_empty() || normalize(&question.searchable_text()).contains(&query))
    }
}

/// One request for a batch of questions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Filters the batch must satisfy
    pub filters: Filters,
    /// Maximum number of questions in the batch
    pub limit: usize,
    /// Number of matching questions already consumed by this reader
    pub offset: usize,
    /// Queue epoch the request was issued in; a later filter change makes it stale
    #[serde(default)]
    pub epoch: u64,
}

/// The outcome of a background refill, handed back with the request it answers
#[derive(Debug, Clone, PartialEq)]
pub struct Refill<Q> {
    /// The request passed to [`QuestionSource::request_refill`]
    pub request: Request,
    /// The fetched batch
    pub batch: Result<Vec<Q>, SourceError>,
}

/// A question source failed to produce a batch
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
pub enum SourceError {
    /// The source could not be reached
    #[error("question source unavailable: {0}")]
    Unavailable(String),
    /// The source answered with questions that fail validation
    #[error("malformed question batch: {0}")]
    Malformed(String),
}

/// Supplier of raw question batches
pub trait QuestionSource<Q> {
    /// Fetches a batch, blocking until it arrives
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when no batch could be produced. Readers
    /// degrade such failures to an empty batch.
    fn fetch(&mut self, request: &Request) -> Result<Vec<Q>, SourceError>;

    /// Starts fetching a batch in the background
    ///
    /// The host delivers the outcome to the reader's `receive_refill` as a
    /// [`Refill`] carrying `request` once it is available.
    fn request_refill(&mut self, request: Request);
}

/// Order in which a [`MemorySource`] hands out questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// A random sample of the matching questions on every fetch
    #[default]
    Random,
    /// Matching questions in pool order, paged by the request offset
    Sequential,
}

/// An in-memory question pool
///
/// Background refills are queued and answered by [`MemorySource::poll_refill`],
/// which lets a host (or a test) decide when the "asynchronous" batch lands.
#[derive(Debug, Clone)]
pub struct MemorySource<Q> {
    pool: Vec<Q>,
    order: Order,
    rng: fastrand::Rng,
    pending: Vec<Request>,
}

impl<Q: Question + Validate<Context = ()> + Clone> MemorySource<Q> {
    /// Creates a source over a pool of questions
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Malformed`] when a question fails validation.
    pub fn new(pool: Vec<Q>, order: Order) -> Result<Self, SourceError> {
        Self::with_rng(pool, order, fastrand::Rng::new())
    }

    /// Creates a source whose random order is reproducible
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Malformed`] when a question fails validation.
    pub fn with_seed(pool: Vec<Q>, order: Order, seed: u64) -> Result<Self, SourceError> {
        Self::with_rng(pool, order, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(pool: Vec<Q>, order: Order, rng: fastrand::Rng) -> Result<Self, SourceError> {
        for question in &pool {
            question
                .validate()
                .map_err(|report| SourceError::Malformed(report.to_string()))?;
        }

        Ok(Self {
            pool,
            order,
            rng,
            pending: Vec::new(),
        })
    }

    /// Number of questions in the pool
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether the pool has no questions
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Number of background refills waiting to be answered
    pub fn pending_refills(&self) -> usize {
        self.pending.len()
    }

    /// Answers the oldest background refill, if any
    pub fn poll_refill(&mut self) -> Option<Refill<Q>> {
        if self.pending.is_empty() {
            return None;
        }
        let request = self.pending.remove(0);
        let batch = self.fetch(&request);
        Some(Refill { request, batch })
    }

    fn sample(&mut self, request: &Request) -> Vec<Q> {
        let matching = self.pool.iter().filter(|question| request.filters.matches(*question));

        match self.order {
            Order::Sequential => matching
                .skip(request.offset)
                .take(request.limit)
                .cloned()
                .collect(),
            Order::Random => {
                let mut matching: Vec<Q> = matching.cloned().collect();
                self.rng.shuffle(&mut matching);
                matching.truncate(request.limit);
                matching
            }
        }
    }
}

impl<Q: Question + Validate<Context = ()> + Clone> QuestionSource<Q> for MemorySource<Q> {
    fn fetch(&mut self, request: &Request) -> Result<Vec<Q>, SourceError> {
        Ok(self.sample(request))
    }

    fn request_refill(&mut self, request: Request) {
        self.pending.push(request);
    }
}
