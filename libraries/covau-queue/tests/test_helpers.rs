//! Shared fixtures for queue integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use covau_core::{
    AutoplayKind, AutoplayQuery, Backend, CovauError, Database, DbItem, DbOps, InfoSource,
    ListItem, MessageHandler, PlaySource, Player, PlayerHandlers, PlayerMessage, SearchSource,
    SharedItem, Song, SourceFactory, SourceQuery,
};
use covau_queue::{
    AutoplayQueue, NotifyLevel, QueueConfig, QueueEvent, QueueEvents, QueueManager,
};
use covau_storage::SqliteDatabase;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::broadcast;

// ===== Items =====

#[derive(Debug, Clone)]
pub struct TestItem {
    pub key: String,
    pub artists: Vec<String>,
    pub playable: bool,
    /// Offer a `Related` autoplay query
    pub related: bool,
    /// Fail when saved as a song
    pub fail_save: bool,
    /// Saving yields no song
    pub unsaved: bool,
    /// No song ids, so the song blacklist never matches it
    pub anonymous: bool,
}

impl TestItem {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            artists: Vec::new(),
            playable: true,
            related: true,
            fail_save: false,
            unsaved: false,
            anonymous: false,
        }
    }

    pub fn by(mut self, artist: &str) -> Self {
        self.artists.push(artist.to_string());
        self
    }

    pub fn unplayable(mut self) -> Self {
        self.playable = false;
        self
    }

    pub fn without_related(mut self) -> Self {
        self.related = false;
        self
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub fn unsaveable(mut self) -> Self {
        self.unsaved = true;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn shared(self) -> SharedItem {
        Arc::new(self)
    }
}

#[async_trait]
impl ListItem for TestItem {
    fn key(&self) -> String {
        self.key.clone()
    }

    fn title(&self) -> String {
        self.key.clone()
    }

    fn is_playable(&self) -> bool {
        self.playable
    }

    fn song_ids(&self) -> Vec<InfoSource> {
        if self.anonymous {
            return Vec::new();
        }
        vec![InfoSource::YtId(self.key.clone())]
    }

    fn artist_ids(&self) -> Vec<InfoSource> {
        self.artists
            .iter()
            .map(|a| InfoSource::MbzId(a.clone()))
            .collect()
    }

    async fn resolve_stream_uri(&self) -> covau_core::Result<Option<PlaySource>> {
        Ok(Some(PlaySource::YtId(self.key.clone())))
    }

    async fn autoplay_query(
        &self,
        kind: AutoplayKind,
    ) -> covau_core::Result<Option<AutoplayQuery>> {
        Ok(match kind {
            AutoplayKind::Related if self.related => Some(AutoplayQuery::Related {
                backend: Backend::SongTube,
                id: self.key.clone(),
            }),
            AutoplayKind::Related => None,
            AutoplayKind::SearchRelated => Some(AutoplayQuery::SearchRelated {
                title: self.key.clone(),
                artists: self.artists.clone(),
            }),
            AutoplayKind::Radio if self.artists.is_empty() => None,
            AutoplayKind::Radio => Some(AutoplayQuery::Radio {
                title: Some(self.key.clone()),
                artists: self.artists.clone(),
            }),
        })
    }

    async fn saved_song(&self, ops: &DbOps) -> covau_core::Result<Option<DbItem<Song>>> {
        if self.fail_save {
            return Err(CovauError::database(format!("cannot save {}", self.key)));
        }
        if self.unsaved {
            return Ok(None);
        }
        let song = Song {
            title: self.key.clone(),
            artists: self.artists.clone(),
            thumbnails: Vec::new(),
            info_sources: vec![InfoSource::YtId(self.key.clone())],
            play_sources: vec![PlaySource::YtId(self.key.clone())],
        };
        Ok(Some(ops.insert_or_get(&song).await?))
    }
}

pub fn item(key: &str) -> SharedItem {
    TestItem::new(key).shared()
}

pub fn items(keys: &[&str]) -> Vec<SharedItem> {
    keys.iter().map(|k| item(k)).collect()
}

pub fn keys(items: &[SharedItem]) -> Vec<String> {
    items.iter().map(|i| i.key()).collect()
}

pub fn titles(items: &[SharedItem]) -> Vec<String> {
    items.iter().map(|i| i.title()).collect()
}

// ===== Player =====

/// Player that records what it was asked to play
pub struct RecordingPlayer {
    played: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    playing: AtomicBool,
    pauses: AtomicUsize,
    handlers: PlayerHandlers,
}

impl RecordingPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            played: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            playing: AtomicBool::new(false),
            pauses: AtomicUsize::new(0),
            handlers: PlayerHandlers::new(),
        })
    }

    /// Titles passed to `play_item`, in order
    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    /// Make `play_item` fail for `key`
    pub fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    /// Report the end of the current track to registered handlers
    pub fn finish_track(&self) {
        self.playing.store(false, Ordering::SeqCst);
        self.emit(PlayerMessage::Finished);
    }

    pub fn emit(&self, message: PlayerMessage) {
        self.handlers.emit(&message);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[async_trait]
impl Player for RecordingPlayer {
    async fn play_item(&self, item: &SharedItem) -> covau_core::Result<()> {
        if self.failing.lock().unwrap().contains(&item.key()) {
            return Err(CovauError::player(format!("cannot play {}", item.title())));
        }
        self.played.lock().unwrap().push(item.title());
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> covau_core::Result<()> {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn unpause(&self) -> covau_core::Result<()> {
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn toggle_pause(&self) -> covau_core::Result<()> {
        self.playing.fetch_xor(true, Ordering::SeqCst);
        Ok(())
    }

    async fn seek_to_perc(&self, _perc: f64) -> covau_core::Result<()> {
        Ok(())
    }

    async fn seek_by(&self, _secs: f64) -> covau_core::Result<()> {
        Ok(())
    }

    async fn set_volume(&self, _volume: f64) -> covau_core::Result<()> {
        Ok(())
    }

    async fn toggle_mute(&self) -> covau_core::Result<()> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn get_progress(&self) -> f64 {
        0.0
    }

    fn on_message(&self, handler: MessageHandler) {
        self.handlers.register(handler);
    }
}

// ===== Sources =====

/// Source replaying scripted pages
pub struct Pages {
    pages: Mutex<VecDeque<covau_core::Result<Vec<SharedItem>>>>,
}

#[async_trait]
impl SearchSource for Pages {
    async fn next_page(&self) -> covau_core::Result<Vec<SharedItem>> {
        let next = self.pages.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    fn has_next_page(&self) -> bool {
        !self.pages.lock().unwrap().is_empty()
    }
}

/// Factory serving scripted feeds, each one opened at most once
///
/// Feeds are keyed `related:<id>`, `search:<query>` or `radio:<artists>`;
/// opening anything else fails.
#[derive(Default)]
pub struct FakeFactory {
    feeds: Mutex<HashMap<String, Vec<covau_core::Result<Vec<SharedItem>>>>>,
    opened: Mutex<Vec<SourceQuery>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn feed(&self, key: &str, pages: Vec<Vec<SharedItem>>) {
        self.feed_results(key, pages.into_iter().map(Ok).collect());
    }

    pub fn feed_results(&self, key: &str, pages: Vec<covau_core::Result<Vec<SharedItem>>>) {
        self.feeds.lock().unwrap().insert(key.to_string(), pages);
    }

    pub fn opened(&self) -> Vec<SourceQuery> {
        self.opened.lock().unwrap().clone()
    }
}

fn feed_key(query: &SourceQuery) -> String {
    match query {
        SourceQuery::Related { id, .. } => format!("related:{}", id),
        SourceQuery::Search { query, .. } => format!("search:{}", query),
        SourceQuery::Radio { query } => format!("radio:{}", query),
        SourceQuery::Ids { ids, .. } => format!("ids:{}", ids.join(",")),
    }
}

#[async_trait]
impl SourceFactory for FakeFactory {
    async fn open(
        &self,
        query: SourceQuery,
        _page_size: usize,
    ) -> covau_core::Result<Box<dyn SearchSource>> {
        let key = feed_key(&query);
        self.opened.lock().unwrap().push(query);
        let pages = self
            .feeds
            .lock()
            .unwrap()
            .remove(&key)
            .ok_or_else(|| CovauError::backend(format!("no feed for {}", key)))?;
        Ok(Box::new(Pages {
            pages: Mutex::new(pages.into()),
        }))
    }
}

// ===== Queues =====

pub fn manager(player: &Arc<RecordingPlayer>) -> QueueManager {
    QueueManager::new(player.clone(), QueueEvents::new())
}

pub fn autoplay_queue(player: &Arc<RecordingPlayer>, factory: &Arc<FakeFactory>) -> AutoplayQueue {
    AutoplayQueue::new(manager(player), factory.clone(), QueueConfig::default())
}

pub fn manual_queue(player: &Arc<RecordingPlayer>, factory: &Arc<FakeFactory>) -> AutoplayQueue {
    let config = QueueConfig {
        autoplay: false,
        ..QueueConfig::default()
    };
    AutoplayQueue::new(manager(player), factory.clone(), config)
}

/// Warning messages received so far
pub fn warnings(rx: &mut broadcast::Receiver<QueueEvent>) -> Vec<String> {
    let mut found = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let QueueEvent::Notify {
            level: NotifyLevel::Warning,
            message,
        } = event
        {
            found.push(message);
        }
    }
    found
}

// ===== Database =====

/// Migrated SQLite database in a temp dir
pub struct TestDb {
    pub db: Arc<SqliteDatabase>,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}", temp_dir.path().join("queue.db").display());
        let db = SqliteDatabase::connect(&db_url)
            .await
            .expect("Failed to open database");
        Self {
            db: Arc::new(db),
            _temp_dir: temp_dir,
        }
    }

    pub fn dyn_db(&self) -> Arc<dyn Database> {
        self.db.clone()
    }
}
