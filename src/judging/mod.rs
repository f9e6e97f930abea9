//! Answer judging engine
//!
//! This module turns a tournament answer line into a set of acceptable and
//! promptable answers and judges free-text submissions against that set.
//! Normalization, answer line parsing, and approximate matching each live in
//! their own submodule; the reading state machines only use [`judge::judge`]
//! and [`answerline::parse`].

pub mod answerline;
pub mod judge;
pub mod normalize;
mod numbers;
pub mod similarity;

pub use answerline::{AnswerSet, parse};
pub use judge::{JudgeVerdict, Judgement, Outcome, Verdict, judge};
pub use normalize::normalize;
