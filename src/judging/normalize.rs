//! Text normalization for answer comparison
//!
//! Both sides of every comparison (the parsed answer line and the submitted
//! answer) go through [`normalize`], so the judge only ever compares
//! lower-case, accent-free, punctuation-free words with numbers spelled out.

use itertools::Itertools;
use once_cell_serde::sync::Lazy;
use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use super::numbers::digits_to_words;

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid regex"));
static RE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid regex"));
static RE_DOTTED_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9](?:\.[0-9]+)+").expect("valid regex"));

/// Entities decoded before the bare `&` is read as "and"
const ENTITIES: [(&str, &str); 7] = [
    ("&amp;", " and "),
    ("&nbsp;", " "),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&lt;", "<"),
    ("&gt;", ">"),
];

/// Canonicalizes text for comparison
///
/// Strips markup, folds case and diacritics, spells out digit runs, drops
/// apostrophes and periods, replaces any other punctuation with spaces, and
/// collapses whitespace. Characters that cannot be mapped are dropped.
/// The function is idempotent: `normalize(&normalize(s)) == normalize(s)`.
///
/// # Examples
///
/// ```rust
/// use buzzer::judging::normalize::normalize;
///
/// assert_eq!(normalize("<b>Dvořák</b>'s  Symphony No. 9"), "dvoraks symphony no nine");
/// ```
pub fn normalize(text: &str) -> String {
    let plain = strip_markup(text);
    let folded = fold(&plain);
    // "3.14" reads as two numbers, not as the digit run 314
    let separated = RE_DOTTED_DIGITS.replace_all(&folded, |caps: &regex::Captures| {
        caps[0].replace('.', " ")
    });
    let expanded = RE_DIGITS.replace_all(&separated, |caps: &regex::Captures| {
        format!(" {} ", digits_to_words(&caps[0]))
    });

    expanded
        .chars()
        .filter_map(|c| match c {
            '\'' | '\u{2018}' | '\u{2019}' | '\u{02bc}' | '`' | '.' => None,
            c if c.is_alphanumeric() => Some(c),
            _ => Some(' '),
        })
        .collect::<String>()
        .split_whitespace()
        .join(" ")
}

/// Removes markup tags and decodes the common HTML entities
///
/// `&` (bare or escaped) is read as the word "and".
pub(crate) fn strip_markup(text: &str) -> String {
    let stripped = RE_TAG.replace_all(text, "");
    ENTITIES
        .iter()
        .fold(stripped.into_owned(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
        .replace('&', " and ")
}

/// Lower-cases and removes diacritics, folding letters that have no decomposition
fn fold(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text
        .nfkd()
        .flat_map(char::to_lowercase)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
    {
        match c {
            'æ' => folded.push_str("ae"),
            'œ' => folded.push_str("oe"),
            'ß' => folded.push_str("ss"),
            'þ' => folded.push_str("th"),
            'ø' => folded.push('o'),
            'ł' => folded.push('l'),
            'đ' | 'ð' => folded.push('d'),
            'ı' => folded.push('i'),
            c => folded.push(c),
        }
    }
    folded
}
