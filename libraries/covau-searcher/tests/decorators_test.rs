//! Behaviour of the pagination decorators and base sources

use async_trait::async_trait;
use covau_core::{
    AutoplayKind, AutoplayQuery, CovauError, DropHandler, InfoSource, ListItem, PlaySource,
    Result, SearchSource, SharedItem,
};
use covau_searcher::{
    AsyncStaticSource, Debounced, ItemList, Offset, OffsetFetcher, Page, PageFetcher, Paged,
    Saved, SearcherExt, StaticSource, Unique,
};
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Helpers =====

#[derive(Debug)]
struct TestItem(String);

#[async_trait]
impl ListItem for TestItem {
    fn key(&self) -> String {
        self.0.clone()
    }

    fn title(&self) -> String {
        format!("title {}", self.0)
    }

    fn is_playable(&self) -> bool {
        true
    }

    fn song_ids(&self) -> Vec<InfoSource> {
        vec![InfoSource::YtId(self.0.clone())]
    }

    fn artist_ids(&self) -> Vec<InfoSource> {
        Vec::new()
    }

    async fn resolve_stream_uri(&self) -> Result<Option<PlaySource>> {
        Ok(None)
    }

    async fn autoplay_query(&self, _kind: AutoplayKind) -> Result<Option<AutoplayQuery>> {
        Ok(None)
    }
}

fn item(key: &str) -> SharedItem {
    Arc::new(TestItem(key.to_string()))
}

fn page(keys: &[&str]) -> Vec<SharedItem> {
    keys.iter().map(|k| item(k)).collect()
}

fn keys(items: &[SharedItem]) -> Vec<String> {
    items.iter().map(|i| i.key()).collect()
}

/// Source that replays scripted pages, counting fetches
struct Scripted {
    pages: Mutex<VecDeque<Result<Vec<SharedItem>>>>,
    fetches: Arc<AtomicUsize>,
    delay: Duration,
}

impl Scripted {
    fn new(pages: Vec<Result<Vec<SharedItem>>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            fetches: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    fn ok(pages: Vec<Vec<SharedItem>>) -> Self {
        Self::new(pages.into_iter().map(Ok).collect())
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SearchSource for Scripted {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.pages.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    fn has_next_page(&self) -> bool {
        !self.pages.lock().unwrap().is_empty()
    }
}

/// Drop handler that accepts everything and reports a fixed removal index
struct AcceptAll {
    remove_at: Option<usize>,
    drops: Mutex<Vec<(String, usize, bool)>>,
}

impl AcceptAll {
    fn new(remove_at: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            remove_at,
            drops: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DropHandler for AcceptAll {
    async fn handle_drop(&self, item: SharedItem, target: usize, is_outsider: bool) -> Result<bool> {
        self.drops
            .lock()
            .unwrap()
            .push((item.key(), target, is_outsider));
        Ok(true)
    }

    async fn remove(&self, _item: SharedItem) -> Result<Option<usize>> {
        Ok(self.remove_at)
    }
}

// ===== Unique =====

#[tokio::test]
async fn unique_filters_repeats_across_and_within_pages() {
    let source = Unique::new(Scripted::ok(vec![
        page(&["a", "b", "a"]),
        page(&["b", "c"]),
    ]));

    assert_eq!(keys(&source.next_page().await.unwrap()), ["a", "b"]);
    assert_eq!(keys(&source.next_page().await.unwrap()), ["c"]);
    assert_eq!(source.seen_count(), 3);
}

proptest! {
    #[test]
    fn unique_never_yields_a_key_twice(pages in prop::collection::vec(prop::collection::vec(0u8..20, 0..8), 0..6)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let expected: HashSet<String> = pages.iter().flatten().map(|k| k.to_string()).collect();
        let pages: Vec<Vec<SharedItem>> = pages
            .iter()
            .map(|p| p.iter().map(|k| item(&k.to_string())).collect())
            .collect();
        let count = pages.len();
        let source = Unique::new(Scripted::ok(pages));

        let mut yielded = Vec::new();
        rt.block_on(async {
            for _ in 0..count {
                yielded.extend(keys(&source.next_page().await.unwrap()));
            }
        });

        let distinct: HashSet<String> = yielded.iter().cloned().collect();
        prop_assert_eq!(distinct.len(), yielded.len());
        prop_assert_eq!(distinct, expected);
    }
}

// ===== Saved =====

#[tokio::test]
async fn saved_returns_accumulated_list() {
    let source = Saved::new(Scripted::ok(vec![page(&["a"]), page(&["b", "c"])]));

    assert_eq!(keys(&source.next_page().await.unwrap()), ["a"]);
    assert_eq!(keys(&source.next_page().await.unwrap()), ["a", "b", "c"]);
    assert_eq!(keys(&source.items()), ["a", "b", "c"]);
    assert!(!source.has_next_page());
}

// ===== Debounced =====

#[tokio::test]
async fn debounced_concurrent_calls_share_one_fetch() {
    let scripted = Scripted::ok(vec![page(&["a"]), page(&["b"])])
        .with_delay(Duration::from_millis(20));
    let fetches = scripted.fetches.clone();
    let source = Debounced::new(scripted);

    let (first, second) = tokio::join!(source.next_page(), source.next_page());

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(keys(&first.unwrap()), ["a"]);
    assert_eq!(keys(&second.unwrap()), ["a"]);
}

#[tokio::test]
async fn debounced_saved_stack_fetches_once_per_concurrent_pair() {
    let scripted = Scripted::ok(vec![page(&["a"]), page(&["b"]), page(&["c"])])
        .with_delay(Duration::from_millis(20));
    let fetches = scripted.fetches.clone();
    let source = scripted.saved().debounced();

    assert_eq!(keys(&source.next_page().await.unwrap()), ["a"]);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    let (first, second) = tokio::join!(source.next_page(), source.next_page());
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(keys(&first.unwrap()), ["a", "b"]);
    assert_eq!(keys(&second.unwrap()), ["a", "b"]);

    let (first, second) = tokio::join!(source.next_page(), source.next_page());
    assert_eq!(fetches.load(Ordering::SeqCst), 3);
    assert_eq!(keys(&first.unwrap()), ["a", "b", "c"]);
    assert_eq!(keys(&second.unwrap()), ["a", "b", "c"]);
}

#[tokio::test]
async fn debounced_sequential_calls_fetch_each_time() {
    let scripted = Scripted::ok(vec![page(&["a"]), page(&["b"])]);
    let fetches = scripted.fetches.clone();
    let source = Debounced::new(scripted);

    assert_eq!(keys(&source.next_page().await.unwrap()), ["a"]);
    assert_eq!(keys(&source.next_page().await.unwrap()), ["b"]);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn debounced_failed_fetch_is_not_shared() {
    let scripted = Scripted::new(vec![
        Err(CovauError::backend("catalog down")),
        Ok(page(&["b"])),
    ])
    .with_delay(Duration::from_millis(20));
    let fetches = scripted.fetches.clone();
    let source = Debounced::new(scripted);

    let (first, second) = tokio::join!(source.next_page(), source.next_page());

    assert!(first.is_err());
    assert_eq!(keys(&second.unwrap()), ["b"]);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

// ===== Droppable =====

#[tokio::test]
async fn droppable_without_handler_declines() {
    let source = StaticSource::new(page(&["a", "b"])).saved().droppable(None);
    source.next_page().await.unwrap();

    assert!(!source.handle_drop(item("z"), None, true).await.unwrap());
    assert_eq!(source.remove(item("a")).await.unwrap(), None);
    assert_eq!(keys(&source.items()), ["a", "b"]);
}

#[tokio::test]
async fn droppable_outsider_defaults_to_end() {
    let handler = AcceptAll::new(None);
    let source = StaticSource::new(page(&["a", "b"]))
        .saved()
        .droppable(Some(handler.clone()));
    source.next_page().await.unwrap();

    assert!(source.handle_drop(item("z"), None, true).await.unwrap());

    assert_eq!(keys(&source.items()), ["a", "b", "z"]);
    assert_eq!(
        handler.drops.lock().unwrap().as_slice(),
        [("z".to_string(), 2, true)]
    );
}

#[tokio::test]
async fn droppable_outsider_duplicate_is_an_error() {
    let source = StaticSource::new(page(&["a", "b"]))
        .saved()
        .droppable(Some(AcceptAll::new(None)));
    source.next_page().await.unwrap();

    let err = source.handle_drop(item("a"), Some(0), true).await.unwrap_err();

    assert!(matches!(err, CovauError::Duplicate(_)));
    assert_eq!(keys(&source.items()), ["a", "b"]);
}

#[tokio::test]
async fn droppable_internal_move_defaults_to_last_slot() {
    let handler = AcceptAll::new(None);
    let source = StaticSource::new(page(&["a", "b", "c"]))
        .saved()
        .droppable(Some(handler.clone()));
    source.next_page().await.unwrap();

    assert!(source.handle_drop(item("a"), None, false).await.unwrap());
    assert_eq!(keys(&source.items()), ["b", "c", "a"]);

    assert!(source.handle_drop(item("a"), Some(0), false).await.unwrap());
    assert_eq!(keys(&source.items()), ["a", "b", "c"]);
    assert_eq!(handler.drops.lock().unwrap()[0], ("a".to_string(), 2, false));
}

#[tokio::test]
async fn droppable_internal_move_of_unknown_item_is_a_fault() {
    let source = StaticSource::new(page(&["a"]))
        .saved()
        .droppable(Some(AcceptAll::new(None)));
    source.next_page().await.unwrap();

    let err = source.handle_drop(item("q"), None, false).await.unwrap_err();
    assert!(matches!(err, CovauError::NotInList(_)));
}

#[tokio::test]
async fn droppable_remove_splices_reported_index() {
    let source = StaticSource::new(page(&["a", "b", "c"]))
        .saved()
        .droppable(Some(AcceptAll::new(Some(1))));
    source.next_page().await.unwrap();

    assert_eq!(source.remove(item("b")).await.unwrap(), Some(1));
    assert_eq!(keys(&source.items()), ["a", "c"]);
}

// ===== Standard stack =====

#[tokio::test]
async fn standard_stack_dedups_and_accumulates() {
    let source = Scripted::ok(vec![page(&["a", "b"]), page(&["b", "c"])]).standard(None);

    assert_eq!(keys(&source.next_page().await.unwrap()), ["a", "b"]);
    assert_eq!(keys(&source.next_page().await.unwrap()), ["a", "b", "c"]);
    assert!(!source.has_next_page());
}

// ===== Base sources =====

#[tokio::test]
async fn static_source_yields_once() {
    let source = StaticSource::new(page(&["a", "b"]));
    assert!(source.has_next_page());

    assert_eq!(keys(&source.next_page().await.unwrap()), ["a", "b"]);
    assert!(!source.has_next_page());
    assert!(source.next_page().await.unwrap().is_empty());
}

#[tokio::test]
async fn async_static_source_loads_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let source = AsyncStaticSource::new(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(page(&["x"]))
    });

    assert_eq!(keys(&source.next_page().await.unwrap()), ["x"]);
    assert!(source.next_page().await.unwrap().is_empty());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(keys(&source.items()), ["x"]);
}

struct Numbered {
    total: usize,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PageFetcher for Numbered {
    async fn fetch_page(&self, page_no: usize, page_size: usize) -> Result<Page> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let start = page_no * page_size;
        let end = (start + page_size).min(self.total);
        Ok(Page {
            items: (start..end).map(|i| item(&i.to_string())).collect(),
            has_next: end < self.total,
        })
    }
}

#[async_trait]
impl OffsetFetcher for Numbered {
    async fn fetch_at(&self, offset: usize, limit: usize) -> Result<Vec<SharedItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let end = (offset + limit).min(self.total);
        Ok((offset..end).map(|i| item(&i.to_string())).collect())
    }
}

#[tokio::test]
async fn paged_stops_calling_fetcher_when_exhausted() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Paged::new(
        Numbered {
            total: 5,
            calls: calls.clone(),
        },
        2,
    );

    let mut all = Vec::new();
    while source.has_next_page() {
        all.extend(keys(&source.next_page().await.unwrap()));
    }
    assert_eq!(all, ["0", "1", "2", "3", "4"]);
    assert!(source.next_page().await.unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn offset_short_page_marks_end() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Offset::new(
        Numbered {
            total: 4,
            calls: calls.clone(),
        },
        3,
    );

    assert_eq!(keys(&source.next_page().await.unwrap()), ["0", "1", "2"]);
    assert!(source.has_next_page());
    assert_eq!(keys(&source.next_page().await.unwrap()), ["3"]);
    assert!(!source.has_next_page());
    assert!(source.next_page().await.unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
