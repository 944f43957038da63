// ============================================================
// CORRECTNESS EXTRACTION
// ============================================================
// Derive correct option letters and explanation text from the free-text
// or structured correctness annotation of a row

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static VOTED_ANSWERS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""voted_answers"\s*:\s*"([A-Ea-e]+)""#).unwrap());

// `**Correct options:** B and D`, `**Correct option**: A`, `__Correct option:__ C`
static EMPHASIZED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\*{1,2}|_{1,2})\s*correct\s+options?\s*(?::\s*(?:\*{1,2}|_{1,2})|(?:\*{1,2}|_{1,2})\s*:)\s*([a-d][^*\n]*)",
    )
    .unwrap()
});

static PLAIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)correct\s+options?\s*:\s*([a-d][^\n]*)").unwrap());

static ANSWER_HEADER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*#{1,6}\s*answers?\s*:?\s*$").unwrap());

/// Longest field still treated as a bare letter list such as `AC` or `A, C`
const LETTER_LIST_MAX_LEN: usize = 20;

const CONJUNCTIONS: [&str; 3] = ["and", "or", "plus"];

/// Which annotation convention produced the letters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Structured `"voted_answers": "AC"` data
    VotedAnswers,
    /// `**Correct option(s):** ...` with markdown emphasis
    MarkdownEmphasized,
    /// `Correct option(s): ...` without emphasis
    MarkdownPlain,
    /// A short bare list: `B`, `AC`, `A,C`
    LetterList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectOptions {
    pub kind: AnnotationKind,
    pub letters: BTreeSet<char>,
}

/// Parse a correctness annotation, trying each convention in priority order:
/// voted answers, emphasized markdown, plain markdown, bare letter list.
/// A convention that matches but names no letter falls through to the next.
pub fn parse_annotation(text: &str) -> Option<CorrectOptions> {
    let found = |kind, letters: BTreeSet<char>| {
        (!letters.is_empty()).then_some(CorrectOptions { kind, letters })
    };

    if let Some(caps) = VOTED_ANSWERS_PATTERN.captures(text) {
        let letters = caps[1].chars().map(|c| c.to_ascii_uppercase()).collect();
        if let Some(options) = found(AnnotationKind::VotedAnswers, letters) {
            return Some(options);
        }
    }

    if let Some(caps) = EMPHASIZED_PATTERN.captures(text) {
        if let Some(options) = found(AnnotationKind::MarkdownEmphasized, leading_letters(&caps[1], 'D')) {
            return Some(options);
        }
    }

    if let Some(caps) = PLAIN_PATTERN.captures(text) {
        if let Some(options) = found(AnnotationKind::MarkdownPlain, leading_letters(&caps[1], 'D')) {
            return Some(options);
        }
    }

    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.len() <= LETTER_LIST_MAX_LEN && is_letter_list(trimmed) {
        return found(AnnotationKind::LetterList, leading_letters(trimmed, 'E'));
    }

    None
}

/// Correct option letters named by an annotation; empty when nothing
/// recognizable is found. Callers decide the fallback.
pub fn extract_correct_options(text: &str) -> BTreeSet<char> {
    parse_annotation(text)
        .map(|options| options.letters)
        .unwrap_or_default()
}

/// Explanation text of a markdown annotation: everything except a leading
/// `# Answer` header and the correct-option line, trimmed. `None` when
/// nothing remains.
pub fn extract_explanation(text: &str) -> Option<String> {
    let mut lines: Vec<&str> = text.lines().collect();

    if let Some(pos) = lines.iter().position(|l| !l.trim().is_empty()) {
        if ANSWER_HEADER_PATTERN.is_match(lines[pos]) {
            lines.remove(pos);
        }
    }

    if let Some(pos) = lines
        .iter()
        .position(|l| EMPHASIZED_PATTERN.is_match(l) || PLAIN_PATTERN.is_match(l))
    {
        lines.remove(pos);
    }

    let explanation = lines.join("\n").trim().to_string();
    (!explanation.is_empty()).then_some(explanation)
}

/// Letters from the leading run of option tokens and conjunctions.
///
/// `B and D` gives B, D; `B - because a queue...` stops at `because`. A
/// lowercase `a` only counts as the first token, elsewhere it is the article.
fn leading_letters(tail: &str, last: char) -> BTreeSet<char> {
    let mut letters = BTreeSet::new();

    let tokens = tail
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty());

    for (idx, token) in tokens.enumerate() {
        if CONJUNCTIONS.contains(&token.to_ascii_lowercase().as_str()) {
            continue;
        }
        match option_token(token, idx == 0, last) {
            Some(found) => letters.extend(found),
            None => break,
        }
    }

    letters
}

fn option_token(token: &str, first: bool, last: char) -> Option<Vec<char>> {
    let in_range = |c: char| ('A'..=last).contains(&c);
    let mut chars = token.chars();

    match (chars.next(), chars.next()) {
        (Some('a'), None) if !first => None,
        (Some(c), None) if in_range(c.to_ascii_uppercase()) => Some(vec![c.to_ascii_uppercase()]),
        // Compact uppercase runs like `AC`
        _ if token.len() <= 5 && token.chars().all(in_range) => Some(token.chars().collect()),
        _ => None,
    }
}

/// Every token is an uppercase option run or a conjunction
fn is_letter_list(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .all(|t| {
            CONJUNCTIONS.contains(&t.to_ascii_lowercase().as_str())
                || t.chars().all(|c| ('A'..='E').contains(&c))
        })
}
