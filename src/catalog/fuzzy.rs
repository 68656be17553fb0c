//! Similarity scores on a 0-100 scale and the text normalization the
//! catalog filters compare with.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").expect("valid regex"));
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Whole-string similarity.
pub fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Similarity after sorting whitespace tokens, so word order is ignored.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Similarity of the shared token set against each side's remainder. A
/// query whose tokens are all contained in the other side scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let left: BTreeSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let right: BTreeSet<String> = b.split_whitespace().map(str::to_lowercase).collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = left.intersection(&right).map(String::as_str).collect();
    let only_left: Vec<&str> = left.difference(&right).map(String::as_str).collect();
    let only_right: Vec<&str> = right.difference(&left).map(String::as_str).collect();

    if !common.is_empty() && (only_left.is_empty() || only_right.is_empty()) {
        return 100.0;
    }

    let sect = common.join(" ");
    let with_left = join_nonempty(&sect, &only_left.join(" "));
    let with_right = join_nonempty(&sect, &only_right.join(" "));

    let mut best = ratio(&with_left, &with_right);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &with_left)).max(ratio(&sect, &with_right));
    }
    best
}

/// Lower-case, drop parenthetical qualifiers and punctuation, collapse
/// whitespace.
pub fn normalize_name(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = PARENTHETICAL.replace_all(&lower, "");
    let stripped = PUNCTUATION.replace_all(&stripped, "");
    collapse(&stripped)
}

/// Lower-case and collapse whitespace.
pub fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_lowercase()
}

/// `\w+` tokens of an already normalized query.
pub fn word_tokens(text: &str) -> Vec<&str> {
    WORD.find_iter(text).map(|m| m.as_str()).collect()
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    tokens.sort();
    tokens.join(" ")
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}
