//! Approximate string similarity
//!
//! Answers are compared with a bigram overlap measure in the Dice family.
//! Whitespace is ignored so "newyork" and "new york" compare as equal.

use std::collections::HashMap;

use itertools::Itertools;

use crate::constants::judge::{ANSWER_WEIGHT, SUBMISSION_WEIGHT};

/// Similarity used by the judge, in `[0, 1]`
///
/// Bigrams of the answer that the submission lacks cost more than extra
/// bigrams in the submission, so a submission that covers only half of a
/// two-word answer stays under the match threshold while small typos do not.
pub fn similarity(submission: &str, answer: &str) -> f64 {
    tversky(submission, answer, ANSWER_WEIGHT, SUBMISSION_WEIGHT)
}

/// The classic Dice coefficient over character bigrams
pub fn dice(a: &str, b: &str) -> f64 {
    tversky(a, b, 0.5, 0.5)
}

/// Tversky index over character bigram multisets
///
/// `|S ∩ A| / (|S ∩ A| + answer_weight · |A − S| + submission_weight · |S − A|)`
/// where `S` and `A` are the bigram multisets of the submission and the
/// answer. Strings shorter than two characters match only when equal.
pub fn tversky(submission: &str, answer: &str, answer_weight: f64, submission_weight: f64) -> f64 {
    let submission = submission.chars().filter(|c| !c.is_whitespace()).collect_vec();
    let answer = answer.chars().filter(|c| !c.is_whitespace()).collect_vec();

    if submission == answer {
        return 1.0;
    }
    if submission.len() < 2 || answer.len() < 2 {
        return 0.0;
    }

    let submission_bigrams = bigrams(&submission);
    let answer_bigrams = bigrams(&answer);

    let shared = submission_bigrams
        .iter()
        .map(|(bigram, count)| (*count).min(answer_bigrams.get(bigram).copied().unwrap_or(0)))
        .sum::<usize>() as f64;
    let missing = (answer.len() - 1) as f64 - shared;
    let extra = (submission.len() - 1) as f64 - shared;

    shared / (shared + answer_weight * missing + submission_weight * extra)
}

fn bigrams(chars: &[char]) -> HashMap<(char, char), usize> {
    chars.iter().copied().tuple_windows::<(char, char)>().counts()
}
