//! Answer line parsing
//!
//! Tournament answer lines are semi-structured free text such as
//!
//! ```text
//! <b><u>Napoleon</u></b> Bonaparte [accept Napoleon I; prompt on Bonaparte; do not accept Corsican] <Smith, History>
//! ```
//!
//! [`parse`] turns one into an [`AnswerSet`]: the answers that are accepted
//! outright and the answers that earn a prompt. The parser is a best-effort
//! heuristic over the usual conventions and never fails.

use itertools::Itertools;
use once_cell_serde::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalize::{normalize, strip_markup};

static RE_ANGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^<>]*)>").expect("valid regex"));
static RE_ESCAPED_ANGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&lt;.*?&gt;").expect("valid regex"));
static RE_MARKUP_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*/?\s*(b|u|i|em|strong|br|span|sup|sub|p)\b").expect("valid regex")
});
static RE_PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]*)(?:\)|$)").expect("valid regex"));
static RE_KEPT_PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(accept|or|prompt)\b").expect("valid regex"));
static RE_BOLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:b|strong)\b[^>]*>(.*?)</(?:b|strong)\s*>").expect("valid regex")
});
static RE_UNDERLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<u\b[^>]*>(.*?)</u\s*>").expect("valid regex"));
static RE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:do not|prompt on|prompt|accept|or|until|before|after)\b")
        .expect("valid regex")
});
static RE_PRIMARY_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[|;| or ").expect("valid regex"));

/// Phrases that turn a following "accept" into a rejection
const ACCEPT_NEGATIONS: [&str; 3] = ["do not", "do not prompt on or", "do not prompt or"];
/// Phrases that turn a following "prompt on" into a rejection
const PROMPT_NEGATIONS: [&str; 2] = ["do not", "do not accept or"];
/// Characters that end a captured answer
const TERMINATORS: [char; 6] = ['[', ']', ';', ',', '(', ')'];
/// Characters that separate clauses when deciding what a bare "or" belongs to
const CLAUSE_SEPARATORS: [char; 3] = ['[', ']', ';'];
/// Leading filler words dropped from captured answers
const FILLERS: [&str; 2] = ["either ", "also "];
/// Lower-case words that may appear inside a personal name
const NAME_PARTICLES: [&str; 11] = [
    "de", "da", "di", "del", "della", "du", "van", "von", "der", "la", "le",
];
/// Words that mark an answer as a title or phrase rather than a name
const CONNECTIVES: [&str; 9] = ["the", "of", "and", "a", "an", "in", "on", "for", "to"];
/// Trailing tokens that are never a last name on their own
const GENERATIONAL_SUFFIXES: [&str; 12] = [
    "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "jr", "sr",
];
/// Leading tokens that may be dropped from any answer
const TITLES: [&str; 20] = [
    "saint",
    "st",
    "sir",
    "dame",
    "king",
    "queen",
    "emperor",
    "empress",
    "pope",
    "president",
    "general",
    "lord",
    "lady",
    "dr",
    "doctor",
    "mr",
    "mrs",
    "ms",
    "prince",
    "princess",
];

/// The normalized answers a question accepts and prompts on
///
/// Both lists are ordered by first appearance in the answer line, contain no
/// duplicates, and never contain empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    /// Answers that are correct outright
    accept: Vec<String>,
    /// Answers that earn a prompt for more information
    prompt: Vec<String>,
}

impl AnswerSet {
    /// Builds an answer set from raw candidate answers
    ///
    /// Every candidate is normalized; empty results and duplicates are
    /// dropped, keeping the first occurrence.
    pub fn new<A, P>(accept: A, prompt: P) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            accept: clean(accept),
            prompt: clean(prompt),
        }
    }

    /// Answers that are correct outright
    pub fn accept(&self) -> &[String] {
        &self.accept
    }

    /// Answers that earn a prompt
    pub fn prompt(&self) -> &[String] {
        &self.prompt
    }

    /// Returns a copy of this set with the prompt answer at `index` removed
    pub(crate) fn without_prompt(&self, index: usize) -> Self {
        Self {
            accept: self.accept.clone(),
            prompt: self
                .prompt
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, answer)| answer.clone())
                .collect(),
        }
    }
}

fn clean<I>(candidates: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    candidates
        .into_iter()
        .map(|candidate| normalize(candidate.as_ref()))
        .filter(|answer| !answer.is_empty())
        .unique()
        .collect()
}

/// Raw answers pulled out of the clauses of an answer line
#[derive(Debug, Default)]
struct Clauses {
    accept: Vec<String>,
    prompt: Vec<String>,
    reject: Vec<String>,
}

/// Parses a raw answer line into the answers it accepts and prompts on
///
/// Never fails. A line without any recognizable structure yields the whole
/// cleaned line as its only acceptable answer.
///
/// # Examples
///
/// ```rust
/// use buzzer::judging::answerline::parse;
///
/// let answers = parse("Napoleon Bonaparte [accept Napoleon I; prompt on Bonaparte]");
/// assert_eq!(answers.accept(), ["napoleon bonaparte", "napoleon i"]);
/// assert_eq!(answers.prompt(), ["bonaparte"]);
/// ```
pub fn parse(answerline: &str) -> AnswerSet {
    let annotated = strip_annotations(answerline);
    let bracketed = convert_parentheticals(&annotated);
    let markup = markup_answers(&bracketed);
    let plain = strip_markup(&bracketed);

    let mut accept = markup.accept;
    accept.extend(primary_answer(&plain));

    let clauses = scan_clauses(&plain);
    accept.extend(clauses.accept);

    let mut prompt = markup.prompt;
    prompt.extend(clauses.prompt);

    let prompt = clean(prompt.iter().flat_map(|answer| with_short_form(answer)));
    let reject = clean(clauses.reject);

    let accept = clean(
        accept
            .iter()
            .flat_map(|answer| {
                let full = normalize(answer);
                let short = short_form(answer)
                    .filter(|short| !prompt.contains(short) && !reject.contains(short));
                std::iter::once(full).chain(short)
            })
            .collect_vec(),
    );

    if accept.is_empty() {
        return AnswerSet {
            accept: clean([plain]),
            prompt,
        };
    }

    AnswerSet { accept, prompt }
}

/// Drops editorial annotations like `<Smith, History>` while keeping markup tags
fn strip_annotations(line: &str) -> String {
    let line = RE_ESCAPED_ANGLE.replace_all(line, " ");
    RE_ANGLE
        .replace_all(&line, |caps: &regex::Captures| {
            if RE_MARKUP_TAG.is_match(&caps[1]) {
                caps[0].to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned()
}

/// Turns `(accept X)`-style asides into bracket clauses and removes the rest
///
/// Innermost parentheses are handled first; an unclosed parenthesis runs to
/// the end of the line.
fn convert_parentheticals(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let next = RE_PARENTHETICAL
            .replace_all(&current, |caps: &regex::Captures| {
                let inner = &caps[1];
                if RE_KEPT_PARENTHETICAL.is_match(inner) {
                    format!("[{inner}]")
                } else {
                    " ".to_string()
                }
            })
            .into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Answers marked up in bold (accepted) or underline (prompted)
///
/// A marked span inside a "do not" clause is ignored, and a bold span inside
/// a "prompt" clause is a prompt answer. Underlines nested in a bold span
/// only mark the required part of an accepted answer and are skipped.
fn markup_answers(line: &str) -> Clauses {
    let mut answers = Clauses::default();
    let lower = line.to_ascii_lowercase();

    let bold = RE_BOLD.captures_iter(line).filter_map(|caps| caps.get(0).zip(caps.get(1)));
    let mut bold_spans = Vec::new();
    for (whole, inner) in bold {
        bold_spans.push(whole.range());
        let clause = clause_before(&lower, whole.start());
        if clause.contains("do not") {
            continue;
        }
        let text = strip_markup(inner.as_str());
        if clause.contains("prompt") {
            answers.prompt.push(text);
        } else {
            answers.accept.push(text);
        }
    }

    for caps in RE_UNDERLINE.captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if bold_spans.iter().any(|span| span.contains(&whole.start())) {
            continue;
        }
        if clause_before(&lower, whole.start()).contains("do not") {
            continue;
        }
        answers.prompt.push(strip_markup(inner.as_str()));
    }

    answers
}

/// The leading answer: everything up to the first bracket, semicolon, or " or "
fn primary_answer(line: &str) -> Option<String> {
    let end = RE_PRIMARY_END.find(line).map_or(line.len(), |m| m.start());
    let primary = trim_capture(&line[..end]);
    (!primary.is_empty()).then(|| primary.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    DoNot,
    PromptOn,
    Prompt,
    Accept,
    Or,
    Limit,
}

impl Keyword {
    fn from_match(text: &str) -> Self {
        match text {
            "do not" => Self::DoNot,
            "prompt on" => Self::PromptOn,
            "prompt" => Self::Prompt,
            "accept" => Self::Accept,
            "or" => Self::Or,
            _ => Self::Limit,
        }
    }
}

/// Scans the control keywords of a line for secondary accept and prompt answers
fn scan_clauses(line: &str) -> Clauses {
    let mut clauses = Clauses::default();
    // ASCII lower-casing keeps byte offsets aligned with `line`
    let lower = line.to_ascii_lowercase();
    let hits = RE_KEYWORD
        .find_iter(&lower)
        .map(|m| (Keyword::from_match(m.as_str()), m.start(), m.end()))
        .collect_vec();

    for (i, &(keyword, start, end)) in hits.iter().enumerate() {
        let next = hits.get(i + 1).map(|&(_, next_start, _)| next_start);
        let before = &lower[..start];

        match keyword {
            Keyword::Accept => {
                let answer = capture(line, end, next);
                if negated(before, &ACCEPT_NEGATIONS) {
                    clauses.reject.push(answer);
                } else {
                    clauses.accept.push(answer);
                }
            }
            Keyword::PromptOn => {
                let answer = capture(line, end, next);
                if negated(before, &PROMPT_NEGATIONS) {
                    clauses.reject.push(answer);
                } else {
                    clauses.prompt.push(answer);
                }
            }
            Keyword::Or if follows_boundary(before) => {
                let answer = capture(line, end, next);
                let clause = clause_before(&lower, start);
                if clause.contains("do not accept") {
                    clauses.reject.push(answer);
                } else if clause.contains("prompt") {
                    if clause.contains("prompt on") && !clause.contains("do not") {
                        clauses.prompt.push(answer);
                    }
                } else {
                    clauses.accept.push(answer);
                }
            }
            Keyword::Or | Keyword::DoNot | Keyword::Prompt | Keyword::Limit => {}
        }
    }

    clauses
}

/// Text after a keyword, up to the next keyword or terminator
fn capture(line: &str, from: usize, next_keyword: Option<usize>) -> String {
    let rest = &line[from..];
    let end = rest
        .find(TERMINATORS)
        .unwrap_or(rest.len())
        .min(next_keyword.map_or(rest.len(), |next| next - from));
    trim_capture(&rest[..end]).to_string()
}

fn trim_capture(text: &str) -> &str {
    let mut text = text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, ':' | '"' | '\u{201c}' | '\u{201d}' | '\'')
    });
    for filler in FILLERS {
        if text
            .get(..filler.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(filler))
        {
            text = text[filler.len()..].trim_start();
        }
    }
    text
}

/// Whether the trimmed text before a keyword ends with one of `negations`
fn negated(before: &str, negations: &[&str]) -> bool {
    let before = before.trim_end();
    negations.iter().any(|negation| before.ends_with(negation))
}

/// A bare "or" only counts after a bracket, comma, semicolon, or space
fn follows_boundary(before: &str) -> bool {
    before
        .chars()
        .next_back()
        .is_none_or(|c| c.is_whitespace() || matches!(c, '[' | '(' | ',' | ';'))
}

/// Text between the last clause separator and `position`
fn clause_before(lower: &str, position: usize) -> &str {
    let before = &lower[..position];
    let from = before.rfind(CLAUSE_SEPARATORS).map_or(0, |i| i + 1);
    &before[from..]
}

/// The answer itself followed by its short form, if any
fn with_short_form(answer: &str) -> impl Iterator<Item = String> + use<> {
    let full = normalize(answer);
    let short = short_form(answer);
    std::iter::once(full).chain(short)
}

/// The normalized answer with its leading name tokens dropped
///
/// A raw answer written like a personal name ("Isaac Newton",
/// "Johann Sebastian Bach") is shortened to its last name. Any other answer
/// only loses leading titles and initials ("Saint Augustine of Hippo" ->
/// "augustine of hippo"). Returns `None` when nothing would be dropped or
/// nothing would be left.
fn short_form(answer: &str) -> Option<String> {
    let normalized = normalize(answer);
    let words = normalized.split(' ').collect_vec();
    let surname_at = words.len().saturating_sub(1);

    let dropped = if looks_like_name(answer) && is_surname(words[surname_at]) {
        surname_at
    } else {
        words
            .iter()
            .take_while(|word| TITLES.contains(word) || is_initial(word))
            .count()
    };
    (dropped > 0 && dropped < words.len()).then(|| words[dropped..].join(" "))
}

/// Whether raw answer text reads as a personal name
///
/// At least two words, each capitalized or a lower-case name particle, and
/// no connective like "of" or "the".
fn looks_like_name(answer: &str) -> bool {
    let plain = strip_markup(answer);
    let words = plain.split_whitespace().collect_vec();
    words.len() >= 2
        && words.iter().all(|word| {
            let lower = word.to_lowercase();
            !CONNECTIVES.contains(&lower.as_str())
                && (NAME_PARTICLES.contains(&lower.as_str())
                    || word
                        .chars()
                        .find(|c| c.is_alphanumeric())
                        .is_some_and(char::is_uppercase))
        })
}

fn is_surname(word: &str) -> bool {
    word.chars().count() > 1 && !GENERATIONAL_SUFFIXES.contains(&word)
}

fn is_initial(word: &str) -> bool {
    word.len() == 1 && word != "a" && word != "i" && word.chars().all(char::is_alphabetic)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_line_is_single_answer() {
        let answers = parse("The Great Gatsby");
        assert_eq!(answers.accept(), ["the great gatsby"]);
        assert!(answers.prompt().is_empty());
    }

    #[test]
    fn test_plain_line_round_trips_through_normalize() {
        for line in ["Photosynthesis", "Guernica", "  Moby-Dick ", "the Bhagavad Gita"] {
            let answers = parse(line);
            assert_eq!(answers.accept(), [normalize(line)]);
            assert!(answers.prompt().is_empty());
        }
    }

    #[test]
    fn test_accept_or_and_parenthetical_rejection() {
        let answers = parse("Mercury [accept Hermes or Quicksilver] (do not accept Venus)");
        assert_eq!(answers.accept(), ["mercury", "hermes", "quicksilver"]);
        assert!(!answers.accept().contains(&"venus".to_string()));
        assert!(answers.prompt().is_empty());
    }

    #[test]
    fn test_bracketed_rejection() {
        let answers = parse("Mercury [accept Hermes or Quicksilver; do not accept Venus]");
        assert_eq!(answers.accept(), ["mercury", "hermes", "quicksilver"]);
    }

    #[test]
    fn test_prompt_then_do_not_accept_or() {
        let answers = parse("Gravity [prompt on force do not accept or force]");
        assert_eq!(answers.accept(), ["gravity"]);
        assert_eq!(answers.prompt(), ["force"]);
    }

    #[test]
    fn test_do_not_accept_or_prompt_on() {
        let answers = parse("Jupiter [accept Zeus; do not accept or prompt on Saturn]");
        assert_eq!(answers.accept(), ["jupiter", "zeus"]);
        assert!(answers.prompt().is_empty());
    }

    #[test]
    fn test_napoleon_line() {
        let answers = parse("Napoleon Bonaparte [accept Napoleon I; prompt on Bonaparte]");
        assert_eq!(answers.accept(), ["napoleon bonaparte", "napoleon i"]);
        assert_eq!(answers.prompt(), ["bonaparte"]);
    }

    #[test]
    fn test_bare_or_in_primary() {
        let answers = parse("pion or pi meson");
        assert_eq!(answers.accept(), ["pion", "pi meson"]);
    }

    #[test]
    fn test_prompt_on_with_or() {
        let answers = parse("Mitochondrion [prompt on organelle or power plant]");
        assert_eq!(answers.accept(), ["mitochondrion"]);
        assert_eq!(answers.prompt(), ["organelle", "power plant"]);
    }

    #[test]
    fn test_prompt_limited_by_until() {
        let answers = parse("Newton's laws [prompt on laws of motion until \"Newton\" is read]");
        assert_eq!(answers.prompt(), ["laws of motion"]);
    }

    #[test]
    fn test_parenthetical_accept_is_kept() {
        let answers = parse("Bolivia (accept Plurinational State of Bolivia) (by Smith)");
        assert_eq!(answers.accept(), ["bolivia", "plurinational state of bolivia"]);
    }

    #[test]
    fn test_parenthetical_aside_removed() {
        let answers = parse("Ganymede (the moon, not the myth)");
        assert_eq!(answers.accept(), ["ganymede"]);
    }

    #[test]
    fn test_editor_annotation_removed() {
        let answers = parse("Kant <Smith, Philosophy>");
        assert_eq!(answers.accept(), ["kant"]);
        let answers = parse("Kant &lt;ED&gt;");
        assert_eq!(answers.accept(), ["kant"]);
    }

    #[test]
    fn test_markup_answers_take_priority() {
        let answers = parse(
            "<b><u>Napoleon</u></b> Bonaparte [accept <b><u>Napoleon I</u></b>; prompt on <b><u>Bonaparte</u></b>]",
        );
        assert_eq!(
            answers.accept(),
            ["napoleon", "napoleon i", "napoleon bonaparte"]
        );
        assert_eq!(answers.prompt(), ["bonaparte"]);
    }

    #[test]
    fn test_underline_outside_bold_is_prompt() {
        let answers = parse("the <u>Reformation</u> [accept Protestant Reformation]");
        assert_eq!(answers.accept(), ["the reformation", "protestant reformation"]);
        assert_eq!(answers.prompt(), ["reformation"]);
    }

    #[test]
    fn test_markup_in_rejection_ignored() {
        let answers = parse("<b>Ares</b> [do not accept <b>Mars</b>]");
        assert_eq!(answers.accept(), ["ares"]);
    }

    #[test]
    fn test_titles_and_initials_give_short_form() {
        let answers = parse("J. R. R. Tolkien");
        assert_eq!(answers.accept(), ["j r r tolkien", "tolkien"]);
        let answers = parse("Saint Augustine of Hippo [accept St. Augustine]");
        assert_eq!(
            answers.accept(),
            ["saint augustine of hippo", "augustine of hippo", "st augustine", "augustine"]
        );
    }

    #[test]
    fn test_personal_name_gives_last_name() {
        let answers = parse("Isaac Newton");
        assert_eq!(answers.accept(), ["isaac newton", "newton"]);

        let answers = parse("Johann Sebastian Bach [prompt on Bach family]");
        assert_eq!(answers.accept(), ["johann sebastian bach", "bach"]);
        assert_eq!(answers.prompt(), ["bach family"]);

        let answers = parse("Alexis de Tocqueville");
        assert_eq!(answers.accept(), ["alexis de tocqueville", "tocqueville"]);
    }

    #[test]
    fn test_generational_suffix_is_not_a_last_name() {
        let answers = parse("Pope Gregory I");
        assert_eq!(answers.accept(), ["pope gregory i", "gregory i"]);
    }

    #[test]
    fn test_phrases_keep_leading_words() {
        assert_eq!(parse("War of 1812").accept(), ["war of eighteen twelve"]);
        assert_eq!(parse("Apollo 11").accept(), ["apollo eleven"]);
        assert_eq!(parse("black holes").accept(), ["black holes"]);
    }

    #[test]
    fn test_short_form_suppressed_when_prompted() {
        let answers = parse("King Lear [prompt on Lear]");
        assert_eq!(answers.accept(), ["king lear"]);
        assert_eq!(answers.prompt(), ["lear"]);
    }

    #[test]
    fn test_either_filler_dropped() {
        let answers = parse("Athens [accept either Athína or Athenai]");
        assert_eq!(answers.accept(), ["athens", "athina", "athenai"]);
    }

    #[test]
    fn test_duplicates_removed_in_order() {
        let answers = parse("Rome [accept ROME or Roma or rome]");
        assert_eq!(answers.accept(), ["rome", "roma"]);
    }

    #[test]
    fn test_malformed_brackets_terminate() {
        let answers = parse("the Ottoman Empire [accept Turkey (prompt on Anatolia");
        assert_eq!(answers.accept(), ["the ottoman empire", "turkey"]);
        assert_eq!(answers.prompt(), ["anatolia"]);

        let answers = parse("((([[[accept");
        assert!(answers.accept().iter().all(|answer| !answer.is_empty()));
    }

    #[test]
    fn test_structure_without_answers_falls_back_to_line() {
        let answers = parse("[accept]");
        assert_eq!(answers.accept(), ["accept"]);
    }

    #[test]
    fn test_empty_line() {
        let answers = parse("");
        assert!(answers.accept().is_empty());
        assert!(answers.prompt().is_empty());
    }

    #[test]
    fn test_answer_set_new_normalizes_and_dedupes() {
        let answers = AnswerSet::new(["Paris", "PARIS", " ", "Paris!"], ["Île-de-France"]);
        assert_eq!(answers.accept(), ["paris"]);
        assert_eq!(answers.prompt(), ["ile de france"]);
    }

    #[test]
    fn test_without_prompt() {
        let answers = AnswerSet::new(["a b"], ["x", "y"]);
        let remaining = answers.without_prompt(0);
        assert_eq!(remaining.prompt(), ["y"]);
        assert_eq!(remaining.accept(), answers.accept());
        assert_eq!(answers.prompt(), ["x", "y"]);
    }
}
