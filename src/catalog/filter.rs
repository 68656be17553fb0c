use std::collections::HashSet;

use tracing::debug;

use super::fuzzy::{collapse, normalize_name, ratio, token_set_ratio, word_tokens};
use super::record::CatalogRecord;
use crate::dialogue::intent::SlotValue;

/// Adaptive name/brewery matching starts here.
pub const START_THRESHOLD: f64 = 90.0;
/// Loosening stops here; nothing at the floor means no match.
pub const FLOOR_THRESHOLD: f64 = 30.0;
pub const CEILING_THRESHOLD: f64 = 100.0;
pub const LOOSEN_STEP: f64 = 5.0;
pub const TIGHTEN_STEP: f64 = 1.0;
/// Largest result the adaptive matcher hands back.
pub const MAX_MATCHES: usize = 10;

/// Style thresholds, tried in order until one yields a match.
pub const STYLE_THRESHOLDS: [f64; 4] = [90.0, 85.0, 80.0, 75.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    Medium,
    High,
    Any,
}

impl Level {
    pub fn parse(value: &SlotValue) -> Self {
        match value.as_text().trim().to_lowercase().as_str() {
            "low" => Level::Low,
            "medium" => Level::Medium,
            "high" => Level::High,
            _ => Level::Any,
        }
    }

    fn abv_band(self) -> (f64, f64) {
        match self {
            Level::Low => (0.0, 4.9),
            Level::Medium => (5.0, 7.9),
            Level::High => (8.0, 100.0),
            Level::Any => (0.0, 100.0),
        }
    }

    fn ibu_band(self) -> (f64, f64) {
        match self {
            Level::Low => (0.0, 20.0),
            Level::Medium => (21.0, 60.0),
            Level::High => (61.0, 120.0),
            Level::Any => (0.0, 120.0),
        }
    }
}

pub fn by_abv(rows: Vec<CatalogRecord>, value: &SlotValue) -> Vec<CatalogRecord> {
    let (low, high) = Level::parse(value).abv_band();
    rows.into_iter()
        .filter(|r| matches!(r.abv_value(), Some(abv) if abv >= low && abv <= high))
        .collect()
}

/// Keeps rows whose IBU interval overlaps the requested band.
pub fn by_ibu(rows: Vec<CatalogRecord>, value: &SlotValue) -> Vec<CatalogRecord> {
    let (low, high) = Level::parse(value).ibu_band();
    rows.into_iter()
        .filter(|r| matches!(r.ibu_range(), Some((min, max)) if max >= low && min <= high))
        .collect()
}

/// `[low, high]` is an inclusive range, a single number a minimum. Anything
/// else keeps every row with a readable rating.
pub fn by_rating(rows: Vec<CatalogRecord>, value: &SlotValue) -> Vec<CatalogRecord> {
    let bounds = match value {
        SlotValue::List(items) if items.len() == 2 => {
            match (items[0].as_number(), items[1].as_number()) {
                (Some(low), Some(high)) => Some((low, high)),
                _ => None,
            }
        }
        other => other.as_number().map(|min| (min, f64::INFINITY)),
    };

    rows.into_iter()
        .filter(|r| match (r.rating_value(), bounds) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(rating), Some((low, high))) => rating >= low && rating <= high,
        })
        .collect()
}

pub fn by_name(rows: Vec<CatalogRecord>, query: &str) -> Vec<CatalogRecord> {
    let target = normalize_name(query);
    let scores = rows.iter().map(|r| ratio(&target, &normalize_name(&r.name))).collect();
    adaptive_match(rows, scores)
}

pub fn by_brewery(rows: Vec<CatalogRecord>, query: &str) -> Vec<CatalogRecord> {
    let target = collapse(query);
    let scores = rows.iter().map(|r| ratio(&target, &collapse(&r.brewery))).collect();
    adaptive_match(rows, scores)
}

/// Searches for a threshold that yields between 1 and `MAX_MATCHES` rows:
/// loosen from the start until something matches, then tighten while too
/// many do. Tightening never loosens again, so the search terminates; a
/// set that cannot be split by threshold is cut to the best-scoring rows.
pub fn adaptive_match(rows: Vec<CatalogRecord>, scores: Vec<f64>) -> Vec<CatalogRecord> {
    let count = |threshold: f64| scores.iter().filter(|s| **s >= threshold).count();

    let mut threshold = START_THRESHOLD;
    while count(threshold) == 0 && threshold > FLOOR_THRESHOLD {
        threshold = (threshold - LOOSEN_STEP).max(FLOOR_THRESHOLD);
    }
    if count(threshold) == 0 {
        debug!("No match down to threshold {}", threshold);
        return Vec::new();
    }

    while count(threshold) > MAX_MATCHES && threshold < CEILING_THRESHOLD {
        let next = (threshold + TIGHTEN_STEP).min(CEILING_THRESHOLD);
        if count(next) == 0 {
            break;
        }
        threshold = next;
    }

    let mut picked: Vec<usize> = (0..rows.len()).filter(|&i| scores[i] >= threshold).collect();
    if picked.len() > MAX_MATCHES {
        picked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        picked.truncate(MAX_MATCHES);
        picked.sort_unstable();
    }
    debug!("Adaptive match settled at threshold {} with {} rows", threshold, picked.len());

    let keep: HashSet<usize> = picked.into_iter().collect();
    rows.into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, r)| r)
        .collect()
}

/// Combines a token-substring match with a fuzzy whole-style match.
pub fn by_style(rows: Vec<CatalogRecord>, query: &str) -> Vec<CatalogRecord> {
    let q = collapse(query);
    let tokens = word_tokens(&q);

    let substring: HashSet<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.style.trim().is_empty())
        .filter(|(_, r)| {
            let style = r.style.to_lowercase();
            tokens.iter().all(|t| style.contains(t))
        })
        .map(|(i, _)| i)
        .collect();

    let mut distinct: Vec<&str> = Vec::new();
    for r in &rows {
        let style = r.style.as_str();
        if !style.trim().is_empty() && !distinct.contains(&style) {
            distinct.push(style);
        }
    }
    let mut fuzzy_styles: Vec<&str> = Vec::new();
    for threshold in STYLE_THRESHOLDS {
        fuzzy_styles = distinct
            .iter()
            .copied()
            .filter(|s| token_set_ratio(&q, s) >= threshold)
            .collect();
        if !fuzzy_styles.is_empty() {
            debug!("Style '{}' matched {:?} at threshold {}", q, fuzzy_styles, threshold);
            break;
        }
    }
    let fuzzy: HashSet<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| fuzzy_styles.contains(&r.style.as_str()))
        .map(|(i, _)| i)
        .collect();

    let keep: HashSet<usize> = match (substring.is_empty(), fuzzy.is_empty()) {
        (false, false) => {
            let both: HashSet<usize> = substring.intersection(&fuzzy).copied().collect();
            if both.is_empty() {
                substring.union(&fuzzy).copied().collect()
            } else {
                both
            }
        }
        (false, true) => substring,
        (true, false) => fuzzy,
        (true, true) => HashSet::new(),
    };

    rows.into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, r)| r)
        .collect()
}
