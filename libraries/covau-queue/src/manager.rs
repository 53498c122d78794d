//! Base queue: ordered items, a play cursor and the play state machine
//!
//! Mutations are split into a synchronous edit that keeps the cursor valid and
//! a [`FollowUp`] describing what should be played afterwards. Wrappers run the
//! follow-up with their own `play_next`, so layered queues observe every
//! transition the base makes.

use async_trait::async_trait;
use covau_core::{Player, SearchSource, SharedItem};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::events::{QueueEvent, QueueEvents};

/// Where the queue is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayState {
    /// Nothing played yet
    #[default]
    Unstarted,
    /// The cursor item is playing
    Playing,
    /// Playing something outside the cursor; next/prev resume the cursor
    Detour,
    /// Ran out of items
    Finished,
}

/// What to play after a list edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum FollowUp {
    Nothing,
    PlayNext,
    Play(usize),
}

/// Items, cursor and play state
pub struct QueueManager {
    pub(crate) items: Vec<SharedItem>,
    pub(crate) playing_index: Option<usize>,
    pub(crate) state: PlayState,
    player: Arc<dyn Player>,
    events: QueueEvents,
    has_next_page: AtomicBool,
    now_playing: Option<SharedItem>,
    last_played: Option<SharedItem>,
    play_attempts: u64,
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("items", &self.items.len())
            .field("playing_index", &self.playing_index)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl QueueManager {
    pub fn new(player: Arc<dyn Player>, events: QueueEvents) -> Self {
        Self {
            items: Vec::new(),
            playing_index: None,
            state: PlayState::Unstarted,
            player,
            events,
            has_next_page: AtomicBool::new(true),
            now_playing: None,
            last_played: None,
            play_attempts: 0,
        }
    }

    pub fn items(&self) -> &[SharedItem] {
        &self.items
    }

    pub fn playing_index(&self) -> Option<usize> {
        self.playing_index
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn player(&self) -> &Arc<dyn Player> {
        &self.player
    }

    pub fn events(&self) -> &QueueEvents {
        &self.events
    }

    /// Item under the cursor
    pub fn current_item(&self) -> Option<&SharedItem> {
        self.playing_index.and_then(|i| self.items.get(i))
    }

    /// Last item handed to the player successfully
    pub fn now_playing(&self) -> Option<&SharedItem> {
        self.now_playing.as_ref()
    }

    /// Number of times the player was asked to play something
    pub fn play_attempts(&self) -> u64 {
        self.play_attempts
    }

    /// Take the item played since the last call, if any
    pub(crate) fn take_last_played(&mut self) -> Option<SharedItem> {
        self.last_played.take()
    }

    pub fn get_item_index(&self, item: &SharedItem) -> Option<usize> {
        let key = item.key();
        self.items.iter().position(|i| i.key() == key)
    }

    pub fn has_next(&self) -> bool {
        match self.playing_index {
            Some(i) => self.items.len() > i + 1,
            None => !self.items.is_empty(),
        }
    }

    pub fn has_prev(&self) -> bool {
        self.playing_index.is_some_and(|i| i > 0)
    }

    /// Replace the list wholesale, e.g. when restoring a persisted queue
    ///
    /// A restored cursor puts the queue in `Detour`, so the next `play_next`
    /// resumes on it.
    pub fn restore(&mut self, items: Vec<SharedItem>, playing_index: Option<usize>) {
        self.playing_index = playing_index.filter(|&i| i < items.len());
        self.items = items;
        self.state = if self.playing_index.is_some() {
            PlayState::Detour
        } else {
            PlayState::Unstarted
        };
        self.changed();
    }

    pub(crate) fn changed(&self) {
        self.has_next_page.store(true, Ordering::Release);
        self.events.emit(QueueEvent::Changed);
    }

    // ===== List edits =====

    /// Append unseen items
    pub(crate) fn push_items(&mut self, items: Vec<SharedItem>) -> FollowUp {
        for item in items {
            if self.get_item_index(&item).is_some() {
                self.events
                    .warn(format!("item \"{}\" already in queue", item.title()));
            } else {
                self.items.push(item);
            }
        }
        self.changed();

        match self.state {
            PlayState::Unstarted | PlayState::Finished => FollowUp::PlayNext,
            PlayState::Playing | PlayState::Detour => FollowUp::Nothing,
        }
    }

    pub(crate) fn insert_item(&mut self, index: usize, item: SharedItem) -> FollowUp {
        if self.get_item_index(&item).is_some() {
            self.events
                .warn(format!("item \"{}\" already in queue", item.title()));
            return FollowUp::Nothing;
        }

        let index = index.min(self.items.len());
        if let Some(cursor) = self.playing_index.as_mut() {
            if *cursor >= index {
                *cursor += 1;
            }
        }
        self.items.insert(index, item);
        self.changed();

        if self.state == PlayState::Finished {
            self.playing_index = Some(index);
            return FollowUp::Play(index);
        }
        FollowUp::Nothing
    }

    pub(crate) fn remove_item(&mut self, index: usize) -> FollowUp {
        if index >= self.items.len() {
            self.events.warn(format!("no item at index {}", index));
            return FollowUp::Nothing;
        }

        let follow_up = match self.playing_index {
            Some(cursor) if cursor > index => {
                self.playing_index = Some(cursor - 1);
                self.items.remove(index);
                FollowUp::Nothing
            }
            Some(cursor) if cursor == index => {
                if self.items.len() == 1 {
                    self.clear_into_detour();
                    return FollowUp::Nothing;
                }
                let was_last = index == self.items.len() - 1;
                self.items.remove(index);
                if was_last {
                    self.playing_index = Some(cursor - 1);
                    self.replay_if_playing()
                } else {
                    // the next item slid into place; step back so play_next lands on it
                    self.playing_index = cursor.checked_sub(1);
                    if self.state == PlayState::Playing {
                        FollowUp::PlayNext
                    } else {
                        FollowUp::Nothing
                    }
                }
            }
            _ => {
                self.items.remove(index);
                FollowUp::Nothing
            }
        };
        self.changed();
        follow_up
    }

    pub(crate) fn clear_into_detour(&mut self) {
        self.items.clear();
        self.playing_index = None;
        self.detour();
        self.changed();
    }

    fn replay_if_playing(&self) -> FollowUp {
        match (self.state, self.playing_index) {
            (PlayState::Playing, Some(cursor)) => FollowUp::Play(cursor),
            _ => FollowUp::Nothing,
        }
    }

    /// Move the item at `from` to `to`, keeping the cursor on its item
    pub(crate) fn move_item(&mut self, from: usize, to: usize) {
        let len = self.items.len();
        if from >= len {
            self.events.warn(format!("no item at index {}", from));
            return;
        }
        let to = to.min(len - 1);

        if let Some(cursor) = self.playing_index {
            if from == cursor {
                self.playing_index = Some(to);
            } else if cursor >= from.min(to) && cursor <= from.max(to) {
                self.playing_index = Some(if from > to { cursor + 1 } else { cursor - 1 });
            }
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.changed();
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.playing_index = None;
        self.state = if self.player.is_playing() {
            PlayState::Detour
        } else {
            PlayState::Unstarted
        };
        self.changed();
    }

    // ===== Playback =====

    pub fn detour(&mut self) {
        self.state = PlayState::Detour;
    }

    /// Enter `Finished`, pausing the player; idempotent
    pub async fn finished(&mut self) -> Result<()> {
        if self.state != PlayState::Finished {
            debug!("Queue finished");
            self.state = PlayState::Finished;
            self.player.pause().await?;
        }
        Ok(())
    }

    /// Play the item at `index`, moving the cursor there
    pub(crate) async fn play_at(&mut self, index: usize) -> Result<()> {
        let Some(item) = self.items.get(index).cloned() else {
            self.events.warn(format!("no item at index {}", index));
            return Ok(());
        };
        self.playing_index = Some(index);
        self.state = PlayState::Playing;
        self.play_item(&item).await;
        Ok(())
    }

    /// Hand `item` to the player; failures become warnings
    pub(crate) async fn play_item(&mut self, item: &SharedItem) {
        self.play_attempts += 1;
        match self.player.play_item(item).await {
            Ok(()) => {
                debug!("Now playing {}", item.title());
                self.now_playing = Some(item.clone());
                self.last_played = Some(item.clone());
                self.events.emit(QueueEvent::NowPlaying(item.clone()));
            }
            Err(e) => self.events.warn(e.to_string()),
        }
    }

    /// Resume the cursor when detouring; returns whether it did
    pub(crate) async fn resume_detour(&mut self) -> Result<bool> {
        if self.state != PlayState::Detour {
            return Ok(false);
        }
        if self.playing_index.is_none() && !self.items.is_empty() {
            self.playing_index = Some(0);
        }
        if let Some(cursor) = self.playing_index {
            self.play_at(cursor).await?;
        }
        Ok(true)
    }

    /// Step the cursor forward and play; stays put past the end
    pub(crate) async fn advance(&mut self) -> Result<()> {
        match self.playing_index {
            Some(cursor) if cursor + 1 < self.items.len() => self.play_at(cursor + 1).await,
            Some(_) => Ok(()),
            None if self.items.is_empty() => Ok(()),
            None => self.play_at(0).await,
        }
    }

    /// Step the cursor back and play; stays put at the start
    pub(crate) async fn retreat(&mut self) -> Result<()> {
        match self.playing_index {
            Some(cursor) if cursor > 0 => self.play_at(cursor - 1).await,
            _ => Ok(()),
        }
    }

    /// Adopt an item already playing elsewhere, keeping the pause state
    pub(crate) async fn adopt(&mut self, item: SharedItem) -> Result<()> {
        if self
            .now_playing
            .as_ref()
            .is_some_and(|curr| curr.key() == item.key())
        {
            return Ok(());
        }
        let keep_playing = self.player.is_playing() || self.player.is_finished();

        self.player.play_item(&item).await?;
        self.now_playing = Some(item.clone());
        self.events.emit(QueueEvent::NowPlaying(item));
        if !keep_playing {
            self.player.pause().await?;
        }
        self.state = PlayState::Playing;
        Ok(())
    }
}

#[async_trait]
impl SearchSource for QueueManager {
    async fn next_page(&self) -> covau_core::Result<Vec<SharedItem>> {
        if !self.has_next_page.swap(false, Ordering::AcqRel) {
            return Ok(Vec::new());
        }
        Ok(self.items.clone())
    }

    fn has_next_page(&self) -> bool {
        self.has_next_page.load(Ordering::Acquire)
    }
}
