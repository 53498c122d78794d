//! Autoplay engine
//!
//! [`AutoplayQueue`] layers a recommendation feed over the base queue. When the
//! queue runs out, the next recommendation that neither the song nor the
//! artist blacklist blocks is appended and played. Queued items always win
//! over recommendations.

mod query;
mod state;

pub use query::{open_source, search_text};
pub use state::{AutoplayInfo, AutoplayState};

use async_trait::async_trait;
use covau_core::{AutoplayKind, SearchSource, SharedItem, SourceFactory};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::blacklist::Blacklist;
use crate::config::QueueConfig;
use crate::error::Result;
use crate::manager::{PlayState, QueueManager};
use crate::play_queue::{run_follow_up, PlayQueue};

pub struct AutoplayQueue {
    queue: QueueManager,
    autoplay: AutoplayState,
    blacklist: Blacklist,
    factory: Arc<dyn SourceFactory>,
    config: QueueConfig,
}

impl std::fmt::Debug for AutoplayQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoplayQueue")
            .field("queue", &self.queue)
            .field("autoplay", &self.autoplay)
            .field("blacklist", &self.blacklist)
            .finish_non_exhaustive()
    }
}

impl AutoplayQueue {
    pub fn new(queue: QueueManager, factory: Arc<dyn SourceFactory>, config: QueueConfig) -> Self {
        let autoplay = if config.autoplay {
            AutoplayState::Uninit
        } else {
            AutoplayState::Disabled { info: None }
        };
        Self {
            queue,
            autoplay,
            blacklist: Blacklist::default(),
            factory,
            config,
        }
    }

    pub fn autoplay_state(&self) -> &AutoplayState {
        &self.autoplay
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub(crate) fn blacklist_mut(&mut self) -> &mut Blacklist {
        &mut self.blacklist
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    // ===== Seeding =====

    /// Start recommending from `item`
    ///
    /// Strategies are tried in [`AutoplayKind::ALL`] order; the first one whose
    /// source yields a non-empty page wins. Returns `false`, changing nothing,
    /// when none does.
    pub async fn init_with_seed(&mut self, item: SharedItem) -> Result<bool> {
        let Some((source, items)) = self.first_working_feed(&item).await else {
            debug!("No autoplay feed for {}", item.title());
            return Ok(false);
        };

        info!("Autoplay seeded from {}", item.title());
        self.blacklist.add_songs(&item);
        self.autoplay = AutoplayState::Init(AutoplayInfo {
            source,
            seed: item,
            items,
            index: 0,
        });
        self.skip_dups().await;

        if matches!(self.queue.state, PlayState::Unstarted | PlayState::Finished) {
            self.next_inner().await?;
        }
        Ok(true)
    }

    async fn first_working_feed(
        &self,
        item: &SharedItem,
    ) -> Option<(Box<dyn SearchSource>, Vec<SharedItem>)> {
        for kind in AutoplayKind::ALL {
            let query = match item.autoplay_query(kind).await {
                Ok(Some(query)) => query,
                Ok(None) => continue,
                Err(e) => {
                    warn!("{:?} autoplay query failed: {}", kind, e);
                    continue;
                }
            };
            let source = match open_source(self.factory.as_ref(), &self.config, query).await {
                Ok(Some(source)) => query::feed(source),
                Ok(None) => continue,
                Err(e) => {
                    warn!("{:?} autoplay source failed: {}", kind, e);
                    continue;
                }
            };
            match source.next_page().await {
                Ok(items) if !items.is_empty() => return Some((source, items)),
                Ok(_) => debug!("{:?} autoplay source is empty", kind),
                Err(e) => warn!("{:?} autoplay page failed: {}", kind, e),
            }
        }
        None
    }

    /// Seed from whatever was played since the last check, if still uninitialised
    async fn seed_from_played(&mut self) -> Result<()> {
        let Some(item) = self.queue.take_last_played() else {
            return Ok(());
        };
        if matches!(self.autoplay, AutoplayState::Uninit) {
            self.init_with_seed(item).await?;
            // whatever init played is covered by the new seed
            self.queue.take_last_played();
        }
        Ok(())
    }

    // ===== Feed =====

    /// Advance past blacklisted or already queued recommendations, fetching
    /// when the cache runs out
    ///
    /// A page that `Unique` emptied out is not the end of the feed; only an
    /// exhausted source or a failed fetch finishes it.
    async fn skip_dups(&mut self) {
        loop {
            let AutoplayState::Init(info) = &mut self.autoplay else {
                return;
            };

            if info.index >= info.items.len() {
                if !info.source.has_next_page() {
                    self.finish_feed();
                    return;
                }
                match info.source.next_page().await {
                    Ok(page) => info.items.extend(page),
                    Err(e) => {
                        self.queue
                            .events()
                            .warn(format!("autoplay source failed: {}", e));
                        self.finish_feed();
                        return;
                    }
                }
                continue;
            }

            let blocked = info.peek().is_some_and(|next| {
                self.blacklist.blocks(next) || self.queue.get_item_index(next).is_some()
            });
            if !blocked {
                return;
            }
            info.index += 1;
        }
    }

    fn finish_feed(&mut self) {
        let state = std::mem::replace(&mut self.autoplay, AutoplayState::Uninit);
        self.autoplay = match state {
            AutoplayState::Init(mut info) => {
                debug!("Autoplay feed exhausted");
                let remaining = info.items.split_off(info.index.min(info.items.len()));
                AutoplayState::Finished { items: remaining }
            }
            other => other,
        };
    }

    /// Take the next recommendation that is not in the queue yet
    async fn autoplay_consume(&mut self) -> Option<SharedItem> {
        // the queue may have gained items since the last skip
        self.skip_dups().await;
        let AutoplayState::Init(info) = &mut self.autoplay else {
            return None;
        };
        let item = info.peek().cloned()?;
        info.index += 1;
        self.skip_dups().await;
        Some(item)
    }

    pub fn autoplay_peek_item(&self) -> Option<&SharedItem> {
        match &self.autoplay {
            AutoplayState::Init(info) => info.peek(),
            _ => None,
        }
    }

    /// Recommendations not consumed yet
    pub fn autoplay_items(&self) -> Vec<SharedItem> {
        match &self.autoplay {
            AutoplayState::Init(info) => info.remaining().to_vec(),
            AutoplayState::Finished { items } => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Drop the next recommendation; reseed from it when the feed runs dry
    pub async fn autoplay_skip(&mut self) -> Result<()> {
        let Some(item) = self.autoplay_consume().await else {
            self.queue.events().warn("No next item found");
            return Ok(());
        };
        self.blacklist.add_songs(&item);
        if self.autoplay_peek_item().is_none() {
            self.init_with_seed(item).await?;
        }
        Ok(())
    }

    /// Play the next recommendation right away
    pub async fn autoplay_next(&mut self) -> Result<()> {
        let Some(item) = self.autoplay_consume().await else {
            self.queue.events().warn("No next item found");
            return Ok(());
        };
        self.blacklist.add_songs(&item);
        let index = match self.queue.get_item_index(&item) {
            Some(index) => index,
            None => {
                let _ = self.queue.push_items(vec![item]);
                self.queue.items.len() - 1
            }
        };
        self.queue.play_at(index).await?;
        self.seed_from_played().await
    }

    // ===== Enable / disable =====

    pub fn autoplay_is_enabled(&self) -> bool {
        self.autoplay.is_enabled()
    }

    pub async fn autoplay_toggle(&mut self) -> Result<()> {
        if self.autoplay_is_enabled() {
            self.autoplay_disable();
            Ok(())
        } else {
            self.autoplay_enable().await
        }
    }

    /// Turn autoplay off, keeping a running feed for later
    pub fn autoplay_disable(&mut self) {
        let state = std::mem::replace(&mut self.autoplay, AutoplayState::Disabled { info: None });
        self.autoplay = match state {
            AutoplayState::Init(info) => AutoplayState::Disabled { info: Some(info) },
            disabled @ (AutoplayState::Disabled { .. } | AutoplayState::DisabledWithSeed { .. }) => {
                disabled
            }
            AutoplayState::Uninit | AutoplayState::Finished { .. } => {
                AutoplayState::Disabled { info: None }
            }
        };
    }

    /// Turn autoplay on, resuming a cached feed without re-querying
    pub async fn autoplay_enable(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.autoplay, AutoplayState::Uninit);
        match state {
            AutoplayState::DisabledWithSeed { seed } => {
                self.init_with_seed(seed).await?;
            }
            AutoplayState::Disabled { info: Some(info) } => {
                self.autoplay = AutoplayState::Init(info);
            }
            AutoplayState::Disabled { info: None } => {
                if let Some(current) = self.queue.current_item().cloned() {
                    self.init_with_seed(current).await?;
                }
            }
            enabled @ (AutoplayState::Uninit
            | AutoplayState::Init(_)
            | AutoplayState::Finished { .. }) => {
                self.autoplay = enabled;
            }
        }

        if self.queue.state == PlayState::Finished {
            self.next_inner().await?;
        }
        self.seed_from_played().await
    }

    pub fn get_seed(&self) -> Option<&SharedItem> {
        match &self.autoplay {
            AutoplayState::Init(info) => Some(&info.seed),
            AutoplayState::Disabled { info } => info.as_ref().map(|i| &i.seed),
            AutoplayState::DisabledWithSeed { seed } => Some(seed),
            AutoplayState::Uninit | AutoplayState::Finished { .. } => None,
        }
    }

    /// Remember `item` as the seed for when autoplay gets enabled
    pub fn set_seed(&mut self, item: SharedItem) {
        self.autoplay = AutoplayState::DisabledWithSeed { seed: item };
    }

    // ===== Blacklists =====

    pub fn add_to_blacklist(&mut self, item: &SharedItem) {
        self.blacklist.add_songs(item);
    }

    pub fn add_artists_to_blacklist(&mut self, item: &SharedItem) {
        self.blacklist.add_artists(item);
    }

    pub fn remove_artists_from_blacklist(&mut self, item: &SharedItem) {
        self.blacklist.remove_artists(item);
    }

    // ===== Playback =====

    async fn next_inner(&mut self) -> Result<()> {
        if self.queue.resume_detour().await? {
            return Ok(());
        }

        if !self.queue.has_next() {
            if let Some(item) = self.autoplay_consume().await {
                self.blacklist.add_songs(&item);
                // advance() below starts it
                let _ = self.queue.push_items(vec![item]);
            }
        }
        self.queue.advance().await
    }
}

#[async_trait]
impl SearchSource for AutoplayQueue {
    async fn next_page(&self) -> covau_core::Result<Vec<SharedItem>> {
        self.queue.next_page().await
    }

    fn has_next_page(&self) -> bool {
        self.queue.has_next_page()
    }
}

#[async_trait]
impl PlayQueue for AutoplayQueue {
    fn manager(&self) -> &QueueManager {
        &self.queue
    }

    fn manager_mut(&mut self) -> &mut QueueManager {
        &mut self.queue
    }

    async fn add(&mut self, items: Vec<SharedItem>) -> Result<()> {
        for item in &items {
            self.blacklist.add_songs(item);
        }
        let follow_up = self.queue.push_items(items);
        run_follow_up(self, follow_up).await
    }

    async fn insert(&mut self, index: usize, item: SharedItem) -> Result<()> {
        self.blacklist.add_songs(&item);
        let follow_up = self.queue.insert_item(index, item);
        run_follow_up(self, follow_up).await
    }

    async fn remove_at(&mut self, index: usize) -> Result<()> {
        let len = self.queue.items.len();
        let replaces_playing_last = self.queue.playing_index == Some(index)
            && index + 1 == len
            && self.queue.state == PlayState::Playing;

        if replaces_playing_last && self.autoplay_peek_item().is_some() {
            if let Some(next) = self.autoplay_consume().await {
                self.queue.items.remove(index);
                self.queue.playing_index = index.checked_sub(1);
                self.blacklist.add_songs(&next);
                let _ = self.queue.push_items(vec![next.clone()]);
                if let Some(at) = self.queue.get_item_index(&next) {
                    self.queue.play_at(at).await?;
                }
                return self.seed_from_played().await;
            }
        }

        let follow_up = self.queue.remove_item(index);
        run_follow_up(self, follow_up).await
    }

    async fn move_to(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.move_item(from, to);
        Ok(())
    }

    async fn play(&mut self, index: usize) -> Result<()> {
        self.queue.play_at(index).await?;
        self.seed_from_played().await
    }

    async fn play_next(&mut self) -> Result<()> {
        self.next_inner().await?;
        self.seed_from_played().await
    }

    async fn play_prev(&mut self) -> Result<()> {
        if !self.queue.resume_detour().await? {
            self.queue.retreat().await?;
        }
        self.seed_from_played().await
    }

    fn has_next(&self) -> bool {
        self.queue.has_next() || matches!(self.autoplay, AutoplayState::Init(_))
    }

    async fn reset(&mut self) -> Result<()> {
        self.queue.clear();
        self.autoplay = AutoplayState::Disabled { info: None };
        self.blacklist = Blacklist::default();
        Ok(())
    }

    async fn detour_play(&mut self, item: SharedItem) -> Result<()> {
        self.queue.play_item(&item).await;
        self.queue.detour();
        self.seed_from_played().await
    }
}
