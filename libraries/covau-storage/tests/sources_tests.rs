//! Integration tests for the local catalog
//!
//! Covers:
//! - multi-term search over titles and artists, with paging
//! - id lookups
//! - related and radio feeds built from shared artists
//! - queries the local catalog cannot serve


use covau_core::{Backend, CovauError, SearchSource, SharedItem, SourceFactory, SourceQuery};
use covau_storage::LocalSourceFactory;
use test_helpers::*;

async fn seeded() -> (TestDb, LocalSourceFactory, Vec<String>) {
    let test_db = TestDb::new().await;
    let stored = insert_songs(
        &test_db.dyn_db(),
        vec![
            song("Teardrop", &["Massive Attack"], "yt-1"),
            song("Angel", &["Massive Attack"], "yt-2"),
            song("Unfinished Sympathy", &["Massive Attack"], "yt-3"),
            song("Glory Box", &["Portishead"], "yt-4"),
            song("Roads", &["Portishead"], "yt-5"),
            song("Karmacoma", &["Massive Attack", "Tricky"], "yt-6"),
        ],
    )
    .await;
    let ids = stored.iter().map(|s| s.id.to_string()).collect();
    let factory = LocalSourceFactory::new(test_db.pool().clone());
    (test_db, factory, ids)
}

fn titles(items: &[SharedItem]) -> Vec<String> {
    items.iter().map(|i| i.title()).collect()
}

async fn drain(source: &dyn SearchSource) -> Vec<SharedItem> {
    let mut all = Vec::new();
    while source.has_next_page() {
        all.extend(source.next_page().await.unwrap());
    }
    all
}

#[tokio::test]
async fn test_search_matches_every_term() {
    let (_db, factory, _) = seeded().await;

    let source = factory
        .open(
            SourceQuery::Search {
                backend: Backend::Local,
                query: "teardrop by massive attack".to_string(),
            },
            10,
        )
        .await
        .unwrap();

    assert_eq!(titles(&drain(source.as_ref()).await), ["Teardrop"]);
}

#[tokio::test]
async fn test_search_pages_until_short_page() {
    let (_db, factory, _) = seeded().await;

    let source = factory
        .open(
            SourceQuery::Search {
                backend: Backend::Local,
                query: "Massive".to_string(),
            },
            2,
        )
        .await
        .unwrap();

    let first = source.next_page().await.unwrap();
    assert_eq!(titles(&first), ["Teardrop", "Angel"]);
    assert!(source.has_next_page());

    let second = source.next_page().await.unwrap();
    assert_eq!(titles(&second), ["Unfinished Sympathy", "Karmacoma"]);

    let third = source.next_page().await.unwrap();
    assert!(third.is_empty());
    assert!(!source.has_next_page());
    assert!(source.next_page().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ids_lookup_keeps_order() {
    let (_db, factory, ids) = seeded().await;

    let source = factory
        .open(
            SourceQuery::Ids {
                backend: Backend::Local,
                ids: vec![ids[3].clone(), ids[0].clone()],
            },
            10,
        )
        .await
        .unwrap();

    let items = source.next_page().await.unwrap();
    assert_eq!(titles(&items), ["Glory Box", "Teardrop"]);
    assert_eq!(items[0].key(), ids[3]);
    assert!(source.next_page().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ids_lookup_rejects_bad_ids() {
    let (_db, factory, _) = seeded().await;

    let bad = factory
        .open(
            SourceQuery::Ids {
                backend: Backend::Local,
                ids: vec!["not-a-number".to_string()],
            },
            10,
        )
        .await;
    assert!(matches!(bad, Err(CovauError::InvalidInput(_))));

    let missing = factory
        .open(
            SourceQuery::Ids {
                backend: Backend::Local,
                ids: vec!["4242".to_string()],
            },
            10,
        )
        .await;
    assert!(matches!(missing, Err(CovauError::NotFound { .. })));
}

#[tokio::test]
async fn test_related_shares_an_artist_and_skips_seed() {
    let (_db, factory, ids) = seeded().await;

    let source = factory
        .open(
            SourceQuery::Related {
                backend: Backend::Local,
                id: ids[3].clone(),
            },
            10,
        )
        .await
        .unwrap();

    assert_eq!(titles(&drain(source.as_ref()).await), ["Roads"]);
}

#[tokio::test]
async fn test_related_to_missing_song_is_not_found() {
    let (_db, factory, _) = seeded().await;

    let result = factory
        .open(
            SourceQuery::Related {
                backend: Backend::Local,
                id: "777".to_string(),
            },
            10,
        )
        .await;
    assert!(matches!(result, Err(CovauError::NotFound { .. })));
}

#[tokio::test]
async fn test_radio_matches_any_listed_artist() {
    let (_db, factory, _) = seeded().await;

    let source = factory
        .open(
            SourceQuery::Radio {
                query: "Tricky, Portishead".to_string(),
            },
            10,
        )
        .await
        .unwrap();

    assert_eq!(
        titles(&drain(source.as_ref()).await),
        ["Glory Box", "Roads", "Karmacoma"]
    );
}

#[tokio::test]
async fn test_other_backends_are_unsupported() {
    let (_db, factory, _) = seeded().await;

    let result = factory
        .open(
            SourceQuery::Search {
                backend: Backend::SongTube,
                query: "anything".to_string(),
            },
            10,
        )
        .await;
    assert!(matches!(result, Err(CovauError::UnsupportedQuery(_))));
}
