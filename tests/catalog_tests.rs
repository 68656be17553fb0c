mod common;

use std::path::PathBuf;

use aleagent::catalog::filter::{adaptive_match, by_brewery, by_name, by_style, MAX_MATCHES};
use aleagent::catalog::fuzzy::{normalize_name, token_set_ratio, token_sort_ratio};
use aleagent::catalog::query::apply_filters;
use aleagent::catalog::{Catalog, CatalogRecord, QueryEngine};
use aleagent::dialogue::{Intent, IntentState, Observation, SlotValue};
use aleagent::error::CatalogError;
use common::{shared_catalog, write_catalog, BEERS_CSV};

fn rows() -> Vec<CatalogRecord> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), BEERS_CSV);
    Catalog::load(path).unwrap().snapshot()
}

fn ids(rows: &[CatalogRecord]) -> Vec<&str> {
    rows.iter().map(|r| r.id.as_str()).collect()
}

fn named(name: &str) -> CatalogRecord {
    CatalogRecord {
        name: name.to_string(),
        ..Default::default()
    }
}

fn state(intent: Intent, writes: &[(&str, SlotValue)]) -> IntentState {
    let mut observation = Observation::new(intent);
    for (slot, value) in writes {
        observation = observation.with(slot, Some(value.clone()));
    }
    let mut state = IntentState::initialize(intent);
    state.merge(&observation);
    state
}

fn text(v: &str) -> SlotValue {
    SlotValue::Text(v.to_string())
}

#[test]
fn test_load_and_missing_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), BEERS_CSV);
    let catalog = Catalog::load(&path).unwrap();
    assert_eq!(catalog.len(), 10);
    assert!(!catalog.has_user_columns());
    assert_eq!(catalog.records()[9].abv_value(), None, "n/a must not parse");

    let broken = write_catalog(dir.path(), "Id,Name,Style\n1,Foo,Lager\n");
    assert!(matches!(Catalog::load(broken), Err(CatalogError::MissingColumn("Beer Full Name"))));
}

#[test]
fn test_normalize_name() {
    assert_eq!(normalize_name("Hoegaarden (White)"), "hoegaarden");
    assert_eq!(normalize_name("  Founder's   Porter!"), "founders porter");
}

#[test]
fn test_similarity_scores() {
    assert_eq!(token_set_ratio("ipa", "American IPA"), 100.0);
    assert!(token_set_ratio("ipa", "India Pale Ale") < 75.0);
    assert_eq!(token_sort_ratio("porter founders", "Founders Porter"), 100.0);
    assert!(token_sort_ratio("Founders Porter", "Founder's Porter") >= 85.0);
}

#[test]
fn test_zero_slots_returns_head_unfiltered() {
    let empty = IntentState::initialize(Intent::GetBeerRecommendation);
    let result = apply_filters(rows(), empty.slots(), Intent::GetBeerRecommendation, 5).unwrap();
    assert_eq!(ids(&result), vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn test_eliminating_filters_report_no_result() {
    let s = state(Intent::GetBeerRecommendation, &[("abv", text("high")), ("ibu", text("low"))]);
    assert!(apply_filters(rows(), s.slots(), Intent::GetBeerRecommendation, 5).is_none());
}

#[test]
fn test_abv_bands_drop_unparsable_rows() {
    let s = state(Intent::GetBeerRecommendation, &[("abv", text("Medium"))]);
    let result = apply_filters(rows(), s.slots(), Intent::GetBeerRecommendation, 10).unwrap();
    assert_eq!(ids(&result), vec!["1", "2", "3", "9"]);

    let s = state(Intent::GetBeerRecommendation, &[("abv", text("whatever"))]);
    let result = apply_filters(rows(), s.slots(), Intent::GetBeerRecommendation, 10).unwrap();
    assert_eq!(result.len(), 9, "unknown level keeps every parsable row");
}

#[test]
fn test_ibu_uses_interval_overlap() {
    let s = state(Intent::GetBeerRecommendation, &[("ibu", text("medium"))]);
    let result = apply_filters(rows(), s.slots(), Intent::GetBeerRecommendation, 10).unwrap();
    // Row 6 spans 60-90 and touches the band edge; row 4 starts at 65.
    assert_eq!(ids(&result), vec!["1", "2", "3", "5", "6", "7", "9"]);
}

#[test]
fn test_rating_range_minimum_and_passthrough() {
    let range = SlotValue::List(vec![SlotValue::Number(4.0), SlotValue::Number(4.5)]);
    let s = state(Intent::GetBeerRecommendation, &[("rating", range)]);
    let result = apply_filters(rows(), s.slots(), Intent::GetBeerRecommendation, 10).unwrap();
    assert_eq!(ids(&result), vec!["1", "2", "3", "6"]);

    let s = state(Intent::GetBeerRecommendation, &[("rating", text("4.5"))]);
    let result = apply_filters(rows(), s.slots(), Intent::GetBeerRecommendation, 10).unwrap();
    assert_eq!(ids(&result), vec!["4"]);

    let s = state(Intent::GetBeerRecommendation, &[("rating", text("great"))]);
    let result = apply_filters(rows(), s.slots(), Intent::GetBeerRecommendation, 10).unwrap();
    assert_eq!(result.len(), 9, "non-numeric rating passes through, minus unrated rows");
}

#[test]
fn test_style_combination_prefers_intersection() {
    let catalog = vec![
        CatalogRecord { id: "a".into(), style: "American IPA".into(), ..Default::default() },
        CatalogRecord { id: "b".into(), style: "India Pale Ale".into(), ..Default::default() },
    ];

    let first = by_style(catalog.clone(), "ipa");
    let second = by_style(catalog.clone(), "  IPA ");
    assert_eq!(ids(&first), vec!["a"]);
    assert_eq!(first, second, "style filter must be deterministic");

    let pale = by_style(catalog, "india pale ale");
    assert_eq!(ids(&pale), vec!["b"]);
}

#[test]
fn test_style_falls_back_to_fuzzy_set() {
    // "stouts" is no substring of any style; fuzzy matching still finds them.
    let result = by_style(rows(), "Irish Dry Stouts");
    assert_eq!(ids(&result), vec!["5"]);

    assert!(by_style(rows(), "zzzz qqqq").is_empty());
}

#[test]
fn test_style_union_when_matches_disjoint() {
    // "Porterhouse Red" only contains the query text; the misspelled
    // "Portar" only scores high on similarity. Neither set covers the other.
    let catalog = vec![
        CatalogRecord { id: "a".into(), style: "Portar".into(), ..Default::default() },
        CatalogRecord { id: "b".into(), style: "Irish Dry Stout".into(), ..Default::default() },
        CatalogRecord { id: "c".into(), style: "Porterhouse Red".into(), ..Default::default() },
    ];

    let result = by_style(catalog, "porter");
    assert_eq!(ids(&result), vec!["a", "c"], "union must come back in catalog order");
}

#[test]
fn test_name_and_brewery_matching() {
    let result = by_name(rows(), "founders porter");
    assert_eq!(ids(&result), vec!["1"]);

    let result = by_name(rows(), "Hoegaarden");
    assert_eq!(ids(&result), vec!["8"]);

    let result = by_brewery(rows(), "founders brewing company");
    assert_eq!(ids(&result), vec!["1", "10"]);

    let result = by_name(rows(), "pliny the eldr");
    assert_eq!(ids(&result), vec!["4"]);
}

#[test]
fn test_adaptive_match_terminates_within_bounds() {
    // Loosening: nothing at 90, some rows once the threshold drops.
    let catalog: Vec<CatalogRecord> = (1..=15).map(|i| named(&format!("beer {}", i))).collect();
    let result = by_name(catalog, "beer");
    assert!(!result.is_empty() && result.len() <= MAX_MATCHES, "got {}", result.len());

    // Identical names cannot be split by threshold; the cap still holds.
    let catalog: Vec<CatalogRecord> = (0..12).map(|_| named("Lager")).collect();
    let result = by_name(catalog, "lager");
    assert_eq!(result.len(), MAX_MATCHES);

    // No similarity at all ends empty at the floor.
    let catalog: Vec<CatalogRecord> = (0..5).map(|_| named("Lager")).collect();
    assert!(by_name(catalog, "qqqqqqqqqqqqqqqqqqqq").is_empty());
}

#[test]
fn test_adaptive_match_does_not_oscillate() {
    // Eleven rows at 92 and nothing above: tightening past 92 would empty
    // the set, so the search must settle instead of loosening again.
    let rows: Vec<CatalogRecord> = (0..11).map(|i| named(&i.to_string())).collect();
    let scores = vec![92.0; 11];
    let result = adaptive_match(rows, scores);
    assert_eq!(result.len(), MAX_MATCHES);
    assert_eq!(result[0].name, "0", "ties keep catalog order");
}

#[tokio::test]
async fn test_top_rated_sorted_and_capped() {
    let dir = tempfile::tempdir().unwrap();
    let engine = QueryEngine::new(shared_catalog(dir.path()), 5);

    let empty = IntentState::initialize(Intent::GetTopRated);
    let list = engine.filter_by_intent(empty.slots(), Intent::GetTopRated).await.unwrap();
    assert_eq!(list.beers.len(), 5);
    let ratings: Vec<f64> = list.beers.iter().map(|b| b.rating.unwrap()).collect();
    assert_eq!(ratings, vec![4.7, 4.4, 4.3, 4.2, 4.0]);

    let stouts = state(Intent::GetTopRated, &[("style", text("stout"))]);
    let list = engine.filter_by_intent(stouts.slots(), Intent::GetTopRated).await.unwrap();
    let names: Vec<&str> = list.beers.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Old Rasputin", "Guinness Draught"]);
}

#[tokio::test]
async fn test_query_result_projection() {
    let dir = tempfile::tempdir().unwrap();
    let engine = QueryEngine::new(shared_catalog(dir.path()), 5);

    let info = state(Intent::GetBeerInfo, &[("name", text("Two Hearted"))]);
    let list = engine.filter_by_intent(info.slots(), Intent::GetBeerInfo).await.unwrap();
    let json = serde_json::to_value(&list).unwrap();

    let beer = &json["beers"][0];
    assert_eq!(beer["id"], 2);
    assert_eq!(beer["full_name"], "Bell's Two Hearted Ale");
    assert_eq!(beer["abv"], 7.0);
    assert_eq!(beer["min_ibu"], 55.0);
    assert_eq!(beer["max_ibu"], 70.0);
    assert_eq!(beer["rating"], 4.4);
}

#[tokio::test]
async fn test_rating_submission_persists_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = shared_catalog(dir.path());
    let path = catalog.read().await.path().to_path_buf();
    let engine = QueryEngine::new(catalog.clone(), 5);

    let first = state(
        Intent::RateBeer,
        &[("name", text("Founders Porter")), ("rating", SlotValue::Number(4.5)), ("comment", text("smooth, roasty"))],
    );
    let receipt = engine.record_user_rating(first.slots()).await.unwrap().unwrap();
    assert_eq!(receipt.beer.name, "Founder's Porter");
    assert_eq!(receipt.beer.brewery, "Founders Brewing Company");
    assert_eq!(receipt.beer.new_rating, SlotValue::Number(4.5));

    // 1. Persisted to disk with the lazily added columns.
    let reloaded = Catalog::load(&path).unwrap();
    assert!(reloaded.has_user_columns());
    assert_eq!(reloaded.len(), 10);
    assert_eq!(reloaded.records()[0].user_rating.as_deref(), Some("4.5"));
    assert_eq!(reloaded.records()[0].user_comment.as_deref(), Some("smooth, roasty"));
    assert_eq!(reloaded.records()[1].user_rating, None);

    // 2. A second submission overwrites in place.
    let second = state(
        Intent::RateBeer,
        &[("name", text("founders porter")), ("rating", SlotValue::Number(3.0)), ("comment", text("too sweet"))],
    );
    engine.record_user_rating(second.slots()).await.unwrap().unwrap();

    let reloaded = Catalog::load(&path).unwrap();
    assert_eq!(reloaded.len(), 10, "rating must not duplicate rows");
    assert_eq!(reloaded.records()[0].user_rating.as_deref(), Some("3"));
    assert_eq!(reloaded.records()[0].user_comment.as_deref(), Some("too sweet"));
    assert_eq!(catalog.read().await.records()[0].user_rating.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_rating_submission_without_match() {
    let dir = tempfile::tempdir().unwrap();
    let engine = QueryEngine::new(shared_catalog(dir.path()), 5);

    let s = state(Intent::RateBeer, &[("name", text("Heineken")), ("rating", SlotValue::Number(2.0))]);
    assert!(engine.record_user_rating(s.slots()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_persist_leaves_catalog_untouched() {
    let records = rows();
    let catalog = Catalog::new(PathBuf::from("/nonexistent/aleagent/beers.csv"), records).into_shared();
    let engine = QueryEngine::new(catalog.clone(), 5);

    let s = state(Intent::RateBeer, &[("name", text("Guinness Draught")), ("rating", SlotValue::Number(5.0))]);
    let result = engine.record_user_rating(s.slots()).await;
    assert!(matches!(result, Err(CatalogError::Persist { .. })));

    let guard = catalog.read().await;
    assert!(guard.records().iter().all(|r| r.user_rating.is_none()));
    assert!(!guard.has_user_columns());
}

const EXTRA_COLUMNS_CSV: &str = "\
Id,Name,Country,Beer Full Name,Style,Brewery,Description,ABV,Min IBU,Max IBU,Rating,Glass
1,Guinness Draught,Ireland,Guinness Draught,Irish Dry Stout,Guinness,Creamy,4.2,25,45,3.9,Pint
2,Old Rasputin,USA,North Coast Old Rasputin,Russian Imperial Stout,North Coast Brewing Co.,Roasty,9.0,60,90,4.3,Snifter
";

#[tokio::test]
async fn test_rating_keeps_unknown_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), EXTRA_COLUMNS_CSV);
    let catalog = Catalog::load(&path).unwrap();
    assert_eq!(catalog.extra_columns(), vec!["Country", "Glass"]);
    let engine = QueryEngine::new(catalog.into_shared(), 5);

    let s = state(
        Intent::RateBeer,
        &[("name", text("Guinness Draught")), ("rating", SlotValue::Number(4.0)), ("comment", text("ok"))],
    );
    engine.record_user_rating(s.slots()).await.unwrap().unwrap();

    // 1. Header keeps its order; the user columns are appended.
    let written = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines[0],
        "Id,Name,Country,Beer Full Name,Style,Brewery,Description,ABV,Min IBU,Max IBU,Rating,Glass,User Rating,User Comment"
    );
    assert_eq!(
        lines[1],
        "1,Guinness Draught,Ireland,Guinness Draught,Irish Dry Stout,Guinness,Creamy,4.2,25,45,3.9,Pint,4,ok"
    );
    assert_eq!(
        lines[2],
        "2,Old Rasputin,USA,North Coast Old Rasputin,Russian Imperial Stout,North Coast Brewing Co.,Roasty,9.0,60,90,4.3,Snifter,,"
    );

    // 2. Unknown cells survive a reload as well.
    let reloaded = Catalog::load(&path).unwrap();
    assert_eq!(reloaded.records()[1].extras, vec!["USA".to_string(), "Snifter".to_string()]);
    assert_eq!(reloaded.records()[0].user_rating.as_deref(), Some("4"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_rewrite_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let catalog = shared_catalog(dir.path());
    let path = catalog.read().await.path().to_path_buf();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let engine = QueryEngine::new(catalog, 5);
    let s = state(Intent::RateBeer, &[("name", text("Guinness Draught")), ("rating", SlotValue::Number(4.0))]);
    engine.record_user_rating(s.slots()).await.unwrap().unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644, "rewrite must keep the catalog's mode");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_ratings_both_persist() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = shared_catalog(dir.path());
    let path = catalog.read().await.path().to_path_buf();
    let first = QueryEngine::new(catalog.clone(), 5);
    let second = QueryEngine::new(catalog.clone(), 5);

    let a = state(Intent::RateBeer, &[("name", text("Old Rasputin")), ("rating", SlotValue::Number(5.0))]);
    let b = state(Intent::RateBeer, &[("name", text("Bitburger Premium")), ("rating", SlotValue::Number(2.0))]);
    let (ra, rb) = tokio::join!(first.record_user_rating(a.slots()), second.record_user_rating(b.slots()));
    assert!(ra.unwrap().is_some());
    assert!(rb.unwrap().is_some());

    let reloaded = Catalog::load(&path).unwrap();
    let rating = |name: &str| {
        reloaded
            .records()
            .iter()
            .find(|r| r.name == name)
            .and_then(|r| r.user_rating.clone())
    };
    assert_eq!(rating("Old Rasputin").as_deref(), Some("5"));
    assert_eq!(rating("Bitburger Premium").as_deref(), Some("2"), "one writer must not drop the other's rating");
}
