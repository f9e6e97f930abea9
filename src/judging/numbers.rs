//! Digit run expansion
//!
//! Turns runs of ASCII digits into words so that "1812" and "eighteen
//! twelve" normalize to the same text. Four-digit runs that look like years
//! are read in pairs, everything else is read as a cardinal number.

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [(u64, &str); 4] = [
    (1_000_000_000_000, "trillion"),
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

/// Longest digit run read as a cardinal; longer runs are read digit by digit
const MAX_CARDINAL_DIGITS: usize = 15;

/// Expands a run of ASCII digits into space separated words
///
/// Runs with a leading zero or longer than fifteen digits are read one digit
/// at a time, so the expansion never overflows and never loses digits.
///
/// # Arguments
///
/// * `digits` - A non-empty string of ASCII digits
///
/// # Returns
///
/// The words for the run, or an empty string if `digits` is not a digit run
pub fn digits_to_words(digits: &str) -> String {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return String::new();
    }

    let mut words = Vec::new();

    if (digits.len() > 1 && digits.starts_with('0')) || digits.len() > MAX_CARDINAL_DIGITS {
        words.extend(digits.bytes().map(|b| ONES[usize::from(b - b'0')]));
        return words.join(" ");
    }

    let Ok(value) = digits.parse::<u64>() else {
        return String::new();
    };

    if digits.len() == 4 && is_year_like(value) {
        push_year(value, &mut words);
    } else {
        push_cardinal(value, &mut words);
    }

    words.join(" ")
}

fn is_year_like(value: u64) -> bool {
    (1100..=1999).contains(&value) || (2010..=2099).contains(&value)
}

/// "1812" -> "eighteen twelve", "1905" -> "nineteen oh five", "1900" -> "nineteen hundred"
fn push_year(value: u64, words: &mut Vec<&'static str>) {
    let (high, low) = (value / 100, value % 100);
    push_below_hundred(high, words);
    match low {
        0 => words.push("hundred"),
        1..=9 => {
            words.push("oh");
            push_below_hundred(low, words);
        }
        _ => push_below_hundred(low, words),
    }
}

fn push_cardinal(value: u64, words: &mut Vec<&'static str>) {
    if value == 0 {
        words.push(ONES[0]);
        return;
    }

    let mut rest = value;
    for (scale, name) in SCALES {
        if rest >= scale {
            push_below_thousand(rest / scale, words);
            words.push(name);
            rest %= scale;
        }
    }
    if rest > 0 {
        push_below_thousand(rest, words);
    }
}

fn push_below_thousand(value: u64, words: &mut Vec<&'static str>) {
    let (hundreds, rest) = (value / 100, value % 100);
    if hundreds > 0 {
        words.push(ONES[hundreds as usize]);
        words.push("hundred");
    }
    if rest > 0 {
        push_below_hundred(rest, words);
    }
}

fn push_below_hundred(value: u64, words: &mut Vec<&'static str>) {
    if value < 20 {
        words.push(ONES[value as usize]);
    } else {
        words.push(TENS[(value / 10) as usize]);
        if value % 10 > 0 {
            words.push(ONES[(value % 10) as usize]);
        }
    }
}
