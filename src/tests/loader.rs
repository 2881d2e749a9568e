use std::sync::Arc;

use crate::catalog::{FallbackDataset, LoadOptions, Provenance};
use crate::errors::CatalogError;
use crate::patterns::{AmountUnit, Confidence, UNKNOWN};

use super::{listing, live_site, loader_with, padded, product_url, MockClient, Recorder, LISTING_URL};

const SIX: [&str; 6] = ["hat", "scarf", "mitts", "cowl", "tote", "socks"];

fn prefer_live() -> LoadOptions {
    LoadOptions {
        prefer_live: true,
        force_live: false,
    }
}

fn force_live() -> LoadOptions {
    LoadOptions {
        prefer_live: true,
        force_live: true,
    }
}

#[tokio::test]
async fn test_live_catalog_accepted_without_duplicates() {
    // "hat" is listed twice
    let slugs = ["hat", "scarf", "mitts", "cowl", "tote", "socks", "hat"];
    let client = Arc::new(live_site(&slugs));
    let loader = loader_with(client.clone(), FallbackDataset::Bundled);
    let status = Recorder::default();

    let catalog = loader.load(prefer_live(), &status).await.unwrap();

    assert_eq!(catalog.provenance, Provenance::Live);
    assert_eq!(catalog.len(), 6);
    assert_eq!(catalog.records[0].title, "hat");
    assert_eq!(catalog.records[0].yarn_type, "wool");
    assert_eq!(catalog.records[0].yarn_weight, "aran");
    assert_eq!(catalog.records[0].amount_min, 200);
    assert_eq!(catalog.records[0].confidence, Confidence::Medium);
    assert_eq!(status.messages(), vec!["Loading live pattern catalog..."]);
    // listing plus one request per distinct candidate
    assert_eq!(client.requests().len(), 7);
}

#[tokio::test]
async fn test_too_few_live_records_falls_back_silently() {
    let client = Arc::new(live_site(&["hat", "scarf", "mitts"]));
    let loader = loader_with(client, FallbackDataset::Bundled);
    let status = Recorder::default();

    let catalog = loader.load(prefer_live(), &status).await.unwrap();

    assert_eq!(catalog.provenance, Provenance::Fallback);
    assert!(catalog.len() >= 5);
    assert_eq!(
        status.messages(),
        vec!["Loading live pattern catalog...", "Loading fallback catalog..."]
    );
}

#[tokio::test]
async fn test_too_few_live_records_with_force_is_an_error() {
    let client = Arc::new(live_site(&["hat", "scarf", "mitts"]));
    let loader = loader_with(client, FallbackDataset::Bundled);

    let err = loader.load(force_live(), &Recorder::default()).await.unwrap_err();

    assert!(matches!(
        err,
        CatalogError::LiveCatalogInsufficient {
            found: 3,
            required: 5
        }
    ));
}

#[tokio::test]
async fn test_listing_failure_falls_back_unless_forced() {
    let client = Arc::new(MockClient::new());
    let loader = loader_with(client, FallbackDataset::Bundled);

    let catalog = loader.load(prefer_live(), &Recorder::default()).await.unwrap();
    assert_eq!(catalog.provenance, Provenance::Fallback);

    let err = loader.load(force_live(), &Recorder::default()).await.unwrap_err();
    match err {
        CatalogError::FetchExhausted(err) => assert_eq!(err.url, LISTING_URL),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_candidates_become_placeholders() {
    let client = Arc::new(
        MockClient::new()
            .with_page(LISTING_URL, listing(&SIX))
            .with_page(&product_url("hat"), padded("Hat in cotton, 100g"))
            .with_page(&product_url("scarf"), padded("Scarf in alpaca, 300 metres"))
            .with_page(&product_url("mitts"), "too short")
            .with_page(&product_url("cowl"), padded("Cowl, no yarn details"))
            .with_page(
                &product_url("tote"),
                format!(
                    "<html><body><script>{}</script></body></html>",
                    "var x = 1;".repeat(60)
                ),
            ),
    );
    let loader = loader_with(client, FallbackDataset::Bundled);

    let catalog = loader.load(prefer_live(), &Recorder::default()).await.unwrap();

    assert_eq!(catalog.provenance, Provenance::Live);
    assert_eq!(catalog.len(), 6);

    let by_slug = |slug: &str| {
        catalog
            .records
            .iter()
            .find(|r| r.url == product_url(slug))
            .unwrap()
            .clone()
    };

    let hat = by_slug("hat");
    assert_eq!((hat.yarn_type.as_str(), hat.amount_min), ("cotton", 100));

    let scarf = by_slug("scarf");
    assert_eq!(scarf.amount_unit, AmountUnit::Meters);
    assert_eq!(scarf.amount_min, 300);

    let cowl = by_slug("cowl");
    assert_eq!(cowl.confidence, Confidence::Low);
    assert_eq!(cowl.amount_min, 0);
    assert_ne!(cowl.notes, "Could not parse yarn details from live page.");

    for slug in ["mitts", "tote", "socks"] {
        let record = by_slug(slug);
        assert_eq!(record.title, slug);
        assert_eq!(record.yarn_type, UNKNOWN);
        assert_eq!(record.yarn_weight, UNKNOWN);
        assert_eq!(record.confidence, Confidence::Low);
        assert_eq!(record.notes, "Could not parse yarn details from live page.");
    }
}

#[tokio::test]
async fn test_candidates_are_capped() {
    let slugs: Vec<String> = (0..30).map(|i| format!("pattern-{i}")).collect();
    let slugs: Vec<&str> = slugs.iter().map(String::as_str).collect();
    let client = Arc::new(live_site(&slugs));
    let loader = loader_with(client.clone(), FallbackDataset::Bundled);

    let catalog = loader.load(prefer_live(), &Recorder::default()).await.unwrap();

    assert_eq!(catalog.len(), 24);
    assert_eq!(client.requests().len(), 25);
    assert_eq!(catalog.records[23].url, product_url("pattern-23"));
}

#[tokio::test]
async fn test_offline_load_never_touches_network() {
    let client = Arc::new(live_site(&SIX));
    let loader = loader_with(client.clone(), FallbackDataset::Bundled);
    let status = Recorder::default();

    let catalog = loader.load(LoadOptions::default(), &status).await.unwrap();

    assert_eq!(catalog.provenance, Provenance::Fallback);
    assert!(client.requests().is_empty());
    assert_eq!(status.messages(), vec!["Loading fallback catalog..."]);
}

#[tokio::test]
async fn test_missing_fallback_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new());
    let loader = loader_with(client, FallbackDataset::File(dir.path().join("nope.json")));

    let err = loader.load(prefer_live(), &Recorder::default()).await.unwrap_err();

    assert!(matches!(err, CatalogError::FallbackUnavailable(_)));
}

#[tokio::test]
async fn test_fallback_file_is_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patterns.json");
    std::fs::write(
        &path,
        r#"[
            {"title": "A", "url": "https://x/a", "yarnType": "wool", "yarnWeight": "aran", "amountMin": 100, "amountUnit": "g"},
            {"title": "A again", "url": "https://x/a", "yarnType": "wool", "yarnWeight": "aran", "amountMin": 100, "amountUnit": "g"},
            {"title": "No url", "url": "", "yarnType": "wool", "yarnWeight": "aran", "amountMin": 100, "amountUnit": "g"},
            {"title": "B", "url": "https://x/b", "yarnType": "cotton", "yarnWeight": "dk", "amountMin": 120, "amountUnit": "m", "confidence": "medium", "notes": "n"}
        ]"#,
    )
    .unwrap();
    let loader = loader_with(Arc::new(MockClient::new()), FallbackDataset::File(path));

    let catalog = loader.load(LoadOptions::default(), &Recorder::default()).await.unwrap();

    let titles: Vec<_> = catalog.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);
}
