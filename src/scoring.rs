//! Point values for tossups and bonuses

use enum_map::Enum;
use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    constants::{bonus, tossup},
    judging::Outcome,
    reader::reveal::BuzzSnapshot,
};

/// A scoring rule was asked for a value it cannot represent
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize)]
pub enum ScoringError {
    /// More correct bonus parts than a bonus has
    #[error("{0} correct parts cannot be scored, a bonus has {count} parts", count = bonus::PART_COUNT)]
    BonusPartCount(usize),
}

/// The four ways a tossup can be scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum TossupScore {
    /// Correct inside the power span
    Power,
    /// Correct outside the power span
    Base,
    /// Incorrect after the question was fully read
    Zero,
    /// Incorrect before the question was fully read
    Neg,
}

fn greater_than(floor: i32) -> impl FnOnce(&i32, &()) -> garde::Result {
    move |value, _| {
        if *value > floor {
            Ok(())
        } else {
            Err(garde::Error::new(format!("must be greater than {floor}")))
        }
    }
}

/// Point values of the tossup outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TossupValues {
    /// Points for a correct buzz inside the power span
    #[garde(custom(greater_than(self.base)))]
    pub power: i32,
    /// Points for a correct buzz outside the power span
    #[garde(range(min = 1))]
    pub base: i32,
    /// Points for an incorrect early buzz
    #[garde(range(max = 0))]
    pub neg: i32,
}

impl Default for TossupValues {
    fn default() -> Self {
        Self {
            power: tossup::POWER_POINTS,
            base: tossup::BASE_POINTS,
            neg: tossup::NEG_POINTS,
        }
    }
}

impl TossupValues {
    /// Points awarded for a score
    pub fn points(&self, score: TossupScore) -> i32 {
        match score {
            TossupScore::Power => self.power,
            TossupScore::Base => self.base,
            TossupScore::Zero => 0,
            TossupScore::Neg => self.neg,
        }
    }
}

/// Classifies a finished tossup attempt
///
/// A wrong answer given after the last word was revealed is not penalized.
pub fn tossup_score(outcome: Outcome, snapshot: &BuzzSnapshot) -> TossupScore {
    match outcome {
        Outcome::Correct if snapshot.in_power => TossupScore::Power,
        Outcome::Correct => TossupScore::Base,
        Outcome::Incorrect if snapshot.at_end() => TossupScore::Zero,
        Outcome::Incorrect => TossupScore::Neg,
    }
}

/// Total points of a bonus with `correct_parts` parts answered correctly
///
/// # Errors
///
/// Returns [`ScoringError::BonusPartCount`] when `correct_parts` exceeds the
/// number of parts in a bonus.
pub fn bonus_points(correct_parts: usize) -> Result<u32, ScoringError> {
    match correct_parts {
        0 => Ok(0),
        1 => Ok(bonus::POINTS_PER_PART),
        2 => Ok(2 * bonus::POINTS_PER_PART),
        3 => Ok(3 * bonus::POINTS_PER_PART),
        count => Err(ScoringError::BonusPartCount(count)),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{question::Word, reader::reveal::Reveal};

    fn snapshot_at(text: &str, index: usize) -> BuzzSnapshot {
        let mut reveal = Reveal::new(Word::split(text));
        for _ in 0..index {
            reveal.advance();
        }
        reveal.snapshot()
    }

    const QUESTION: &str = "This emperor (*) lost at Waterloo.";

    #[test]
    fn test_power_beats_base() {
        let values = TossupValues::default();
        let early = snapshot_at(QUESTION, 2);
        let late = snapshot_at(QUESTION, 4);

        let power = tossup_score(Outcome::Correct, &early);
        let base = tossup_score(Outcome::Correct, &late);
        assert_eq!(power, TossupScore::Power);
        assert_eq!(base, TossupScore::Base);
        assert!(values.points(power) > values.points(base));
    }

    #[test]
    fn test_neg_only_before_the_end() {
        let values = TossupValues::default();
        let early = snapshot_at(QUESTION, 4);
        let end = snapshot_at(QUESTION, 6);

        assert_eq!(tossup_score(Outcome::Incorrect, &early), TossupScore::Neg);
        assert_eq!(values.points(TossupScore::Neg), -5);
        assert_eq!(tossup_score(Outcome::Incorrect, &end), TossupScore::Zero);
        assert_eq!(values.points(TossupScore::Zero), 0);
    }

    #[test]
    fn test_buzz_before_first_word_of_power_question() {
        let snapshot = snapshot_at(QUESTION, 0);
        assert_eq!(tossup_score(Outcome::Correct, &snapshot), TossupScore::Power);
    }

    #[test]
    fn test_no_power_span() {
        let snapshot = snapshot_at("A question without a marker", 1);
        assert_eq!(tossup_score(Outcome::Correct, &snapshot), TossupScore::Base);
    }

    #[test]
    fn test_bonus_points() {
        assert_eq!(bonus_points(0), Ok(0));
        assert_eq!(bonus_points(1), Ok(10));
        assert_eq!(bonus_points(2), Ok(20));
        assert_eq!(bonus_points(3), Ok(30));
        assert_eq!(bonus_points(4), Err(ScoringError::BonusPartCount(4)));
    }

    #[test]
    fn test_values_validation() {
        assert!(TossupValues::default().validate().is_ok());
        let flat = TossupValues {
            power: 10,
            base: 10,
            neg: -5,
        };
        assert!(flat.validate().is_err());
        let rewarding_neg = TossupValues {
            power: 20,
            base: 10,
            neg: 5,
        };
        assert!(rewarding_neg.validate().is_err());
    }

    #[test]
    fn test_scoring_error_message() {
        assert_eq!(
            ScoringError::BonusPartCount(5).to_string(),
            "5 correct parts cannot be scored, a bonus has 3 parts"
        );
    }
}
