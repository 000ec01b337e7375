//! Integration tests for the explorer session

use bank_tree::prelude::*;

const TRAINING: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/bank-training.arff");
const HOLDOUT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/bank-holdout.arff");

fn session(config: ExplorerConfig) -> ExplorerSession {
    ExplorerSession::from_files(TRAINING, HOLDOUT, config).unwrap()
}

#[test]
fn test_full_flow() {
    let mut s = session(ExplorerConfig::default());

    let attrs = s.attributes();
    assert_eq!(attrs.len(), 12);

    let chart = s.distribution_chart("age").unwrap();
    assert_eq!(chart.title, "age distribution");
    assert_eq!(chart.labels.len(), 8);

    let report = s.train(Some(3)).unwrap();
    assert!(report.depth <= 3);
    assert_eq!(report.metrics.n_samples, 8);
    assert!(report.tree_text.starts_with("|--- "));
    assert!(report.to_markdown().contains("## Holdout"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["max_depth"], 3);
}

#[test]
fn test_repeated_requests_hit_cache() {
    let mut s = session(ExplorerConfig::default());
    s.train(Some(2)).unwrap();
    let misses = s.cache_stats().misses;

    s.train(Some(4)).unwrap();
    s.summarize("region").unwrap();
    assert_eq!(s.cache_stats().misses, misses);
    assert!(s.cache_stats().hits > 0);
}

#[test]
fn test_previews() {
    let mut s = session(ExplorerConfig::default().with_preview_rows(5));

    let encoded = s.preview(None).unwrap();
    assert_eq!(encoded.height(), 5);
    assert_eq!(encoded.width(), 18);

    let raw = s.preview_raw(Some(3)).unwrap();
    assert_eq!(raw.height(), 3);
    assert_eq!(raw.width(), 12);
}

#[test]
fn test_observed_universe_surfaces_mismatch() {
    let config = ExplorerConfig::default().with_category_universe(CategoryUniverse::Observed);
    let mut s = session(config);
    assert!(matches!(s.train(None), Err(BankTreeError::SchemaMismatch { .. })));
    // summaries only touch the training table
    assert!(s.summarize("region").is_ok());
}

#[test]
fn test_alternate_label() {
    let mut s = session(ExplorerConfig::default().with_label_column("mortgage"));
    let summary = s.summarize("pep").unwrap();
    assert_eq!(summary.total(), 24);
    assert!(s.train(Some(2)).is_ok());
}

#[test]
fn test_schema_mismatch_between_files() {
    let train = load_arff(TRAINING).unwrap();
    let holdout = parse_arff("@relation h\n@attribute age numeric\n@data\n40\n").unwrap();
    assert!(matches!(
        ExplorerSession::new(train, holdout, ExplorerConfig::default()),
        Err(BankTreeError::SchemaMismatch { .. })
    ));
}
