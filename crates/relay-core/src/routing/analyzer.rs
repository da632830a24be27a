//! Task complexity analysis
//!
//! A deterministic, side-effect-free heuristic: it scans the description for
//! classes of signal phrases and sums fixed weights, clamped to `[1, 10]`.
//! It is not a classifier and its weights are not tuned per deployment.

/// Phrases that indicate a multi-step task: +2 per distinct phrase
const CONNECTORS: &[&str] = &[
    "then",
    "after that",
    "first",
    "second",
    "also",
    "additionally",
    "next",
    "furthermore",
];

/// Words that widen the scope of a task: +2 per distinct word
const SCOPE_WORDS: &[&str] = &["all", "every", "entire", "whole", "across"];

/// Architectural terms: +3 per distinct term
const ARCHITECTURE_TERMS: &[&str] = &[
    "architecture",
    "refactor",
    "redesign",
    "migrate",
    "restructure",
    "system",
    "integration",
];

/// Derive a complexity score in `1..=10` from a task description
pub fn analyze_complexity(description: &str) -> u8 {
    let lower = description.to_lowercase();
    let mut score: i32 = 1;

    for phrase in CONNECTORS {
        if contains_signal(&lower, phrase) {
            score += 2;
        }
    }

    let conjunctions = lower.split_whitespace().filter(|w| *w == "and").count();
    if conjunctions > 2 {
        score += 1;
    }

    for word in SCOPE_WORDS {
        if contains_signal(&lower, word) {
            score += 2;
        }
    }

    for term in ARCHITECTURE_TERMS {
        if contains_signal(&lower, term) {
            score += 3;
        }
    }

    let words = description.split_whitespace().count();
    if words > 50 {
        score += 2;
    } else if words > 30 {
        score += 1;
    }

    score.clamp(1, 10) as u8
}

/// Match a signal against lowercased text
///
/// Single words are matched on word boundaries so that "all" does not fire
/// inside "additionally" or "install"; multi-word phrases use substring
/// matching.
fn contains_signal(lower: &str, signal: &str) -> bool {
    if signal.contains(' ') {
        lower.contains(signal)
    } else {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w == signal)
    }
}
