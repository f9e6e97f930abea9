//! Judging submitted answers against a parsed answer set

use enum_map::Enum;
use serde::{Deserialize, Serialize};

use super::{answerline::AnswerSet, normalize::normalize, similarity::similarity};
use crate::constants::{answer_text::MAX_LENGTH, judge::MATCH_THRESHOLD};

/// The kind of a verdict without its associated data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum Verdict {
    /// The submission matches an acceptable answer
    Correct,
    /// The submission matches a promptable answer
    Prompt,
    /// The submission matches nothing
    Incorrect,
}

/// A verdict that ends an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum Outcome {
    /// The attempt was correct
    Correct,
    /// The attempt was incorrect
    Incorrect,
}

/// The result of judging one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JudgeVerdict {
    /// The submission matches an acceptable answer
    Correct {
        /// Similarity to the best matching acceptable answer
        similarity: f64,
    },
    /// The submission matches a promptable answer, which is now consumed
    Prompt {
        /// Similarity to the consumed promptable answer
        similarity: f64,
        /// The promptable answer that was matched and removed
        consumed: String,
    },
    /// The submission matches nothing
    Incorrect {
        /// Best similarity seen against any answer
        similarity: f64,
    },
}

impl JudgeVerdict {
    /// Returns the kind of this verdict
    pub fn kind(&self) -> Verdict {
        match self {
            Self::Correct { .. } => Verdict::Correct,
            Self::Prompt { .. } => Verdict::Prompt,
            Self::Incorrect { .. } => Verdict::Incorrect,
        }
    }

    /// Returns the best-match similarity carried by this verdict
    pub fn similarity(&self) -> f64 {
        match self {
            Self::Correct { similarity }
            | Self::Prompt { similarity, .. }
            | Self::Incorrect { similarity } => *similarity,
        }
    }

    /// Returns the terminal outcome, or `None` for a prompt
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Correct { .. } => Some(Outcome::Correct),
            Self::Incorrect { .. } => Some(Outcome::Incorrect),
            Self::Prompt { .. } => None,
        }
    }
}

/// A verdict together with the answer set to judge the next submission against
#[derive(Debug, Clone, PartialEq)]
pub struct Judgement {
    /// The verdict for the submission
    pub verdict: JudgeVerdict,
    /// The answer set after judging; a prompt verdict removes the matched prompt
    pub remaining: AnswerSet,
}

/// Judges a submission against an answer set
///
/// Acceptable answers are tried first. If none matches and promptable
/// answers remain, the best matching one is removed from the returned set so
/// an identical resubmission cannot trigger the same prompt again. An empty
/// answer set or an empty submission is simply incorrect.
///
/// # Examples
///
/// ```rust
/// use buzzer::judging::{answerline::parse, judge::{judge, Verdict}};
///
/// let answers = parse("Napoleon Bonaparte [accept Napoleon I; prompt on Bonaparte]");
/// let first = judge(&answers, "bonaparte");
/// assert_eq!(first.verdict.kind(), Verdict::Prompt);
/// let second = judge(&first.remaining, "bonaparte");
/// assert_eq!(second.verdict.kind(), Verdict::Incorrect);
/// ```
pub fn judge(answers: &AnswerSet, submission: &str) -> Judgement {
    let submission: String = submission.chars().take(MAX_LENGTH).collect();
    let submission = normalize(&submission);

    if submission.is_empty() {
        return Judgement {
            verdict: JudgeVerdict::Incorrect { similarity: 0.0 },
            remaining: answers.clone(),
        };
    }

    let (_, accept_score) = best_match(answers.accept(), &submission);
    if accept_score > MATCH_THRESHOLD {
        return Judgement {
            verdict: JudgeVerdict::Correct {
                similarity: accept_score,
            },
            remaining: answers.clone(),
        };
    }

    let (prompt_index, prompt_score) = best_match(answers.prompt(), &submission);
    if let Some(index) = prompt_index.filter(|_| prompt_score > MATCH_THRESHOLD) {
        return Judgement {
            verdict: JudgeVerdict::Prompt {
                similarity: prompt_score,
                consumed: answers.prompt()[index].clone(),
            },
            remaining: answers.without_prompt(index),
        };
    }

    Judgement {
        verdict: JudgeVerdict::Incorrect {
            similarity: accept_score.max(prompt_score),
        },
        remaining: answers.clone(),
    }
}

/// Index and score of the most similar candidate; `(None, 0.0)` when there are none
fn best_match(candidates: &[String], submission: &str) -> (Option<usize>, f64) {
    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| (index, similarity(submission, candidate)))
        .fold((None, 0.0), |(best_index, best), (index, score)| {
            if best_index.is_none() || score > best {
                (Some(index), score)
            } else {
                (best_index, best)
            }
        })
}
