use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, info};

use super::filter;
use super::fuzzy::token_sort_ratio;
use super::record::{BeerView, CatalogRecord};
use super::store::SharedCatalog;
use crate::dialogue::intent::{Intent, SlotValue};
use crate::dialogue::registry::Slots;
use crate::error::CatalogError;

pub const DEFAULT_TOP_K: usize = 5;
/// Minimum token-sort similarity for a rating target.
pub const RATING_MATCH_CUTOFF: f64 = 85.0;
/// Candidates considered when resolving a rating target.
pub const RATING_CANDIDATES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeerList {
    pub beers: Vec<BeerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedBeer {
    pub name: String,
    pub brewery: String,
    pub new_rating: SlotValue,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingReceipt {
    pub beer: RatedBeer,
}

/// Applies one filter per set slot, in slot order, over an owned snapshot.
/// `None` means the filters eliminated every row; with no slot set the
/// snapshot comes back unfiltered.
pub fn apply_filters(
    mut rows: Vec<CatalogRecord>,
    slots: &Slots,
    intent: Intent,
    top_k: usize,
) -> Option<Vec<CatalogRecord>> {
    for (slot, value) in slots {
        let Some(value) = value else { continue };
        rows = match *slot {
            "style" => filter::by_style(rows, &value.as_text()),
            "abv" => filter::by_abv(rows, value),
            "ibu" => filter::by_ibu(rows, value),
            "rating" => filter::by_rating(rows, value),
            "name" => filter::by_name(rows, &value.as_text()),
            "brewery" => filter::by_brewery(rows, &value.as_text()),
            _ => rows,
        };
        debug!("After {} filter: {} rows", slot, rows.len());
    }

    if rows.is_empty() {
        return None;
    }

    if intent == Intent::GetTopRated {
        rows.sort_by(|a, b| match (a.rating_value(), b.rating_value()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
    rows.truncate(top_k);
    Some(rows)
}

/// Best catalog name for `name` at or above the cutoff.
pub fn resolve_rating_target(records: &[CatalogRecord], name: &str) -> Option<String> {
    let mut distinct: Vec<&str> = Vec::new();
    for r in records {
        let n = r.name.as_str();
        if !n.trim().is_empty() && !distinct.contains(&n) {
            distinct.push(n);
        }
    }

    let mut scored: Vec<(&str, f64)> = distinct
        .into_iter()
        .map(|candidate| (candidate, token_sort_ratio(name, candidate)))
        .filter(|(_, score)| *score >= RATING_MATCH_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(RATING_CANDIDATES);
    debug!("Rating candidates for '{}': {:?}", name, scored);

    scored.first().map(|(candidate, _)| candidate.to_string())
}

/// Catalog queries and the rating write, over the shared table.
#[derive(Clone)]
pub struct QueryEngine {
    catalog: SharedCatalog,
    top_k: usize,
}

impl QueryEngine {
    pub fn new(catalog: SharedCatalog, top_k: usize) -> Self {
        Self { catalog, top_k }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub async fn filter_by_intent(&self, slots: &Slots, intent: Intent) -> Option<BeerList> {
        let snapshot = self.catalog.read().await.snapshot();
        let rows = apply_filters(snapshot, slots, intent, self.top_k)?;
        Some(BeerList { beers: rows.iter().map(CatalogRecord::view).collect() })
    }

    /// Stores the user's rating (and comment) on every row carrying the
    /// resolved name and rewrites the table. `Ok(None)` when the name does
    /// not resolve or a required slot is missing.
    pub async fn record_user_rating(&self, slots: &Slots) -> Result<Option<RatingReceipt>, CatalogError> {
        let (Some(Some(name)), Some(Some(rating))) = (slots.get("name"), slots.get("rating")) else {
            return Ok(None);
        };
        let comment = slots.get("comment").cloned().flatten().map(|c| c.as_text());

        let mut catalog = self.catalog.write().await;
        let Some(target) = resolve_rating_target(catalog.records(), &name.as_text()) else {
            info!("No catalog beer close to '{}'", name);
            return Ok(None);
        };

        let mut records = catalog.snapshot();
        let mut brewery = None;
        for record in records.iter_mut().filter(|r| r.name == target) {
            record.user_rating = Some(rating.to_string());
            if let Some(text) = &comment {
                record.user_comment = Some(text.clone());
            }
            brewery.get_or_insert_with(|| record.brewery.clone());
        }

        catalog.commit(records).await?;
        info!("Recorded rating {} for '{}'", rating, target);

        Ok(Some(RatingReceipt {
            beer: RatedBeer {
                name: target,
                brewery: brewery.unwrap_or_else(|| "Unknown".to_string()),
                new_rating: rating.clone(),
                comment,
            },
        }))
    }
}
