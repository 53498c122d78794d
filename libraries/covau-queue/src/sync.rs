//! Autoplay queue persisted to a covau database
//!
//! Every item entering the queue is saved as a song first, in one transaction
//! per operation; if saving fails the queue is left untouched. After each
//! mutating operation the queue entity and any changed blacklist are written
//! back.

use async_trait::async_trait;
use covau_core::database::get;
use covau_core::{
    txn, ArtistBlacklist, CovauError, Database, DbId, DbItem, DbOps, ListenQueue, Playlist, Queue,
    SearchSource, SharedItem, SongBlacklist, SongItem,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::autoplay::{AutoplayQueue, AutoplayState};
use crate::error::Result;
use crate::manager::QueueManager;
use crate::play_queue::PlayQueue;

const QUEUE_TITLE: &str = "queue";
const SEEN_TITLE: &str = "seen songs";
const BLACKLIST_TITLE: &str = "artist blacklist";

/// Ids of the persisted entities a [`LocalSyncQueue`] works against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncIds {
    pub queue: Option<DbId>,
    pub seen: Option<DbId>,
    pub blacklist: Option<DbId>,
}

pub struct LocalSyncQueue {
    queue: AutoplayQueue,
    db: Arc<dyn Database>,
    entity: DbItem<Queue>,
    seen: DbItem<SongBlacklist>,
    artist_blacklist: DbItem<ArtistBlacklist>,
}

impl std::fmt::Debug for LocalSyncQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSyncQueue")
            .field("queue", &self.queue)
            .field("entity", &self.entity.id)
            .field("seen", &self.seen.id)
            .field("artist_blacklist", &self.artist_blacklist.id)
            .finish_non_exhaustive()
    }
}

impl LocalSyncQueue {
    /// Load the entities named by `ids`, creating any that are missing, and
    /// restore the persisted items, cursor and blacklists into `queue`
    pub async fn load(db: Arc<dyn Database>, mut queue: AutoplayQueue, ids: SyncIds) -> Result<Self> {
        let entity = match ids.queue {
            Some(id) => get::<Queue>(db.as_ref(), id).await?,
            None => None,
        };
        let entity = match entity {
            Some(entity) => entity,
            None => create(&db, &empty_queue()).await?,
        };

        let seen = match ids.seen {
            Some(id) => get::<SongBlacklist>(db.as_ref(), id).await?,
            None => None,
        };
        let seen = match seen {
            Some(seen) => seen,
            None => create(&db, &empty_seen()).await?,
        };

        let artist_blacklist = match ids.blacklist {
            Some(id) => get::<ArtistBlacklist>(db.as_ref(), id).await?,
            None => None,
        };
        let artist_blacklist = match artist_blacklist {
            Some(bl) => bl,
            None => create(&db, &empty_blacklist()).await?,
        };

        let mut items: Vec<SharedItem> = Vec::with_capacity(entity.t.queue.queue.songs.len());
        for id in &entity.t.queue.queue.songs {
            match get(db.as_ref(), *id).await? {
                Some(song) => items.push(Arc::new(SongItem::new(song))),
                None => warn!("Queued song {} no longer exists", id),
            }
        }
        let cursor = entity.t.queue.current_index.map(|i| i as usize);
        info!(
            "Restored queue {} with {} items (cursor {:?})",
            entity.id,
            items.len(),
            cursor
        );
        queue.manager_mut().restore(items, cursor);

        if let Some(seed_id) = entity.t.seed {
            if matches!(queue.autoplay_state(), AutoplayState::Disabled { info: None }) {
                if let Some(song) = get(db.as_ref(), seed_id).await? {
                    queue.set_seed(Arc::new(SongItem::new(song)));
                }
            }
        }

        queue.blacklist_mut().replace_songs(seen.t.songs.clone());
        queue
            .blacklist_mut()
            .replace_artists(artist_blacklist.t.artists.clone());

        Ok(Self {
            queue,
            db,
            entity,
            seen,
            artist_blacklist,
        })
    }

    pub fn autoplay(&self) -> &AutoplayQueue {
        &self.queue
    }

    pub fn ids(&self) -> SyncIds {
        SyncIds {
            queue: Some(self.entity.id),
            seen: Some(self.seen.id),
            blacklist: Some(self.artist_blacklist.id),
        }
    }

    /// Persisted queue entity as last written
    pub fn entity(&self) -> &DbItem<Queue> {
        &self.entity
    }

    pub fn seen(&self) -> &DbItem<SongBlacklist> {
        &self.seen
    }

    pub fn artist_blacklist(&self) -> &DbItem<ArtistBlacklist> {
        &self.artist_blacklist
    }

    // ===== Fresh entities =====

    /// Start persisting into a new queue entity
    pub async fn new_queue(&mut self) -> Result<()> {
        self.entity = create(&self.db, &empty_queue()).await?;
        info!("New queue entity {}", self.entity.id);
        self.update_queue().await
    }

    /// Start a new, empty song blacklist
    pub async fn new_seen(&mut self) -> Result<()> {
        self.seen = create(&self.db, &empty_seen()).await?;
        self.queue.blacklist_mut().replace_songs(Vec::new());
        info!("New song blacklist {}", self.seen.id);
        Ok(())
    }

    /// Start a new, empty artist blacklist
    pub async fn new_blacklist(&mut self) -> Result<()> {
        self.artist_blacklist = create(&self.db, &empty_blacklist()).await?;
        self.queue.blacklist_mut().replace_artists(Vec::new());
        info!("New artist blacklist {}", self.artist_blacklist.id);
        Ok(())
    }

    // ===== Persistence =====

    /// Save every item as a song, all or nothing
    async fn persist_items(&self, items: Vec<SharedItem>) -> Result<Vec<SharedItem>> {
        txn(&self.db, |ops| async move {
            let mut saved: Vec<SharedItem> = Vec::with_capacity(items.len());
            for item in items {
                let song = item.saved_song(&ops).await?.ok_or_else(|| {
                    CovauError::invalid_input(format!(
                        "item \"{}\" cannot be saved as a song",
                        item.title()
                    ))
                })?;
                saved.push(Arc::new(SongItem::new(song)));
            }
            Ok(saved)
        })
        .await
    }

    async fn persist_item(&self, item: SharedItem) -> Result<SharedItem> {
        let mut saved = self.persist_items(vec![item]).await?;
        saved
            .pop()
            .ok_or_else(|| CovauError::database("saved item went missing").into())
    }

    /// Write seed, cursor and song ids to the queue entity
    ///
    /// Items that joined without being saved (autoplay recommendations) are
    /// saved as songs in the same transaction. Items that cannot be saved are
    /// left out, and the cursor is written against the saved list. An unsaved
    /// cursor item moves it to the next saved song, if there is one.
    async fn update_queue(&mut self) -> Result<()> {
        let items = self.queue.items().to_vec();
        let seed = self.queue.get_seed().cloned();
        let playing_index = self.queue.playing_index();
        let current = &self.entity;

        let entity = txn(&self.db, |ops| async move {
            let mut entity = current.clone();
            let mut songs = Vec::with_capacity(items.len());
            let mut current_index = None;
            for (index, item) in items.iter().enumerate() {
                if playing_index == Some(index) {
                    current_index = Some(songs.len() as u32);
                }
                if let Some(id) = song_id(&ops, item).await? {
                    songs.push(id);
                }
            }
            entity.t.queue.queue.songs = songs;
            entity.t.queue.current_index = current_index;
            if let Some(seed) = seed {
                if let Some(id) = song_id(&ops, &seed).await? {
                    entity.t.seed = Some(id);
                }
            }

            if entity != *current {
                ops.update(&entity).await?;
                debug!("Queue {} written", entity.id);
            }
            Ok::<_, CovauError>(entity)
        })
        .await?;
        self.entity = entity;
        Ok(())
    }

    /// Write back whichever blacklist changed
    async fn sync_blacklists(&mut self) -> Result<()> {
        let changes = self.queue.blacklist_mut().take_changes();
        if changes.songs {
            let mut seen = self.seen.clone();
            seen.t.songs = self.queue.blacklist().songs().list().to_vec();
            txn(&self.db, |ops| {
                let seen = &seen;
                async move { ops.update(seen).await }
            })
            .await?;
            self.seen = seen;
        }
        if changes.artists {
            let mut bl = self.artist_blacklist.clone();
            bl.t.artists = self.queue.blacklist().artists().list().to_vec();
            txn(&self.db, |ops| {
                let bl = &bl;
                async move { ops.update(bl).await }
            })
            .await?;
            self.artist_blacklist = bl;
        }
        Ok(())
    }

    async fn persist(&mut self) -> Result<()> {
        self.sync_blacklists().await?;
        self.update_queue().await
    }

    // ===== Autoplay =====

    pub async fn init_with_seed(&mut self, item: SharedItem) -> Result<bool> {
        let item = self.persist_item(item).await?;
        if matches!(self.queue.autoplay_state(), AutoplayState::Uninit) {
            self.new_seen().await?;
        }
        let seeded = self.queue.init_with_seed(item).await?;
        if seeded {
            self.persist().await?;
        }
        Ok(seeded)
    }

    pub async fn autoplay_toggle(&mut self) -> Result<()> {
        self.queue.autoplay_toggle().await?;
        self.persist().await
    }

    pub async fn autoplay_enable(&mut self) -> Result<()> {
        self.queue.autoplay_enable().await?;
        self.persist().await
    }

    pub fn autoplay_disable(&mut self) {
        self.queue.autoplay_disable();
    }

    pub async fn autoplay_skip(&mut self) -> Result<()> {
        self.queue.autoplay_skip().await?;
        self.persist().await
    }

    pub async fn autoplay_next(&mut self) -> Result<()> {
        self.queue.autoplay_next().await?;
        self.persist().await
    }

    pub fn autoplay_items(&self) -> Vec<SharedItem> {
        self.queue.autoplay_items()
    }

    pub fn set_seed(&mut self, item: SharedItem) {
        self.queue.set_seed(item);
    }

    pub async fn add_to_blacklist(&mut self, item: &SharedItem) -> Result<()> {
        self.queue.add_to_blacklist(item);
        self.sync_blacklists().await
    }

    pub async fn add_artists_to_blacklist(&mut self, item: &SharedItem) -> Result<()> {
        self.queue.add_artists_to_blacklist(item);
        self.sync_blacklists().await
    }

    pub async fn remove_artists_from_blacklist(&mut self, item: &SharedItem) -> Result<()> {
        self.queue.remove_artists_from_blacklist(item);
        self.sync_blacklists().await
    }
}

/// Database id of `item`, saving it as a song when it has none
async fn song_id(ops: &DbOps, item: &SharedItem) -> covau_core::Result<Option<DbId>> {
    match item.db_id() {
        Some(id) => Ok(Some(id)),
        None => Ok(item.saved_song(ops).await?.map(|song| song.id)),
    }
}

async fn create<T: covau_core::DbAble>(db: &Arc<dyn Database>, t: &T) -> Result<DbItem<T>> {
    let item = txn(db, |ops| async move { ops.insert_or_get(t).await }).await?;
    Ok(item)
}

fn empty_queue() -> Queue {
    Queue {
        queue: ListenQueue {
            queue: Playlist {
                title: QUEUE_TITLE.to_string(),
                songs: Vec::new(),
            },
            current_index: None,
        },
        seed: None,
    }
}

fn empty_seen() -> SongBlacklist {
    SongBlacklist {
        title: SEEN_TITLE.to_string(),
        songs: Vec::new(),
    }
}

fn empty_blacklist() -> ArtistBlacklist {
    ArtistBlacklist {
        title: BLACKLIST_TITLE.to_string(),
        artists: Vec::new(),
    }
}

#[async_trait]
impl SearchSource for LocalSyncQueue {
    async fn next_page(&self) -> covau_core::Result<Vec<SharedItem>> {
        self.queue.next_page().await
    }

    fn has_next_page(&self) -> bool {
        self.queue.has_next_page()
    }
}

#[async_trait]
impl PlayQueue for LocalSyncQueue {
    fn manager(&self) -> &QueueManager {
        self.queue.manager()
    }

    fn manager_mut(&mut self) -> &mut QueueManager {
        self.queue.manager_mut()
    }

    async fn add(&mut self, items: Vec<SharedItem>) -> Result<()> {
        let items = self.persist_items(items).await?;
        self.queue.add(items).await?;
        self.persist().await
    }

    async fn insert(&mut self, index: usize, item: SharedItem) -> Result<()> {
        let item = self.persist_item(item).await?;
        self.queue.insert(index, item).await?;
        self.persist().await
    }

    async fn remove_at(&mut self, index: usize) -> Result<()> {
        self.queue.remove_at(index).await?;
        self.persist().await
    }

    async fn move_to(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.move_to(from, to).await?;
        self.persist().await
    }

    async fn play(&mut self, index: usize) -> Result<()> {
        self.queue.play(index).await?;
        self.persist().await
    }

    async fn play_next(&mut self) -> Result<()> {
        self.queue.play_next().await?;
        self.persist().await
    }

    async fn play_prev(&mut self) -> Result<()> {
        self.queue.play_prev().await?;
        self.persist().await
    }

    fn has_next(&self) -> bool {
        self.queue.has_next()
    }

    async fn reset(&mut self) -> Result<()> {
        self.queue.reset().await?;
        self.new_seen().await?;
        // the artist blacklist is curated by the user and outlives a queue
        let artists = self.artist_blacklist.t.artists.clone();
        self.queue.blacklist_mut().replace_artists(artists);
        self.persist().await
    }

    async fn detour_play(&mut self, item: SharedItem) -> Result<()> {
        self.queue.detour_play(item).await?;
        self.persist().await
    }

    async fn sync_play(&mut self, item: SharedItem) -> Result<()> {
        self.queue.sync_play(item).await
    }
}
