//! The operation surface shared by every queue layer

use async_trait::async_trait;
use covau_core::{SearchSource, SharedItem};

use crate::error::{QueueError, Result};
use crate::manager::{FollowUp, PlayState, QueueManager};

/// Queue operations
///
/// Each layer ([`QueueManager`], `AutoplayQueue`, `LocalSyncQueue`) implements
/// the required operations; the provided ones are defined in terms of them.
#[async_trait]
pub trait PlayQueue: SearchSource {
    fn manager(&self) -> &QueueManager;

    fn manager_mut(&mut self) -> &mut QueueManager;

    /// Append items; starts playback when unstarted or finished
    async fn add(&mut self, items: Vec<SharedItem>) -> Result<()>;

    /// Insert at `index` (clamped to the length)
    async fn insert(&mut self, index: usize, item: SharedItem) -> Result<()>;

    async fn remove_at(&mut self, index: usize) -> Result<()>;

    /// Move the item at `from` to `to` (clamped to the last index)
    async fn move_to(&mut self, from: usize, to: usize) -> Result<()>;

    /// Play the item at `index`
    async fn play(&mut self, index: usize) -> Result<()>;

    async fn play_next(&mut self) -> Result<()>;

    async fn play_prev(&mut self) -> Result<()>;

    fn has_next(&self) -> bool;

    /// Clear the queue
    async fn reset(&mut self) -> Result<()>;

    /// Play `item` once outside the queue; next/prev then resume the cursor
    async fn detour_play(&mut self, item: SharedItem) -> Result<()>;

    /// Adopt an item already playing elsewhere
    async fn sync_play(&mut self, item: SharedItem) -> Result<()> {
        self.manager_mut().adopt(item).await
    }

    fn items(&self) -> &[SharedItem] {
        self.manager().items()
    }

    fn playing_index(&self) -> Option<usize> {
        self.manager().playing_index()
    }

    fn state(&self) -> PlayState {
        self.manager().state()
    }

    fn current_item(&self) -> Option<SharedItem> {
        self.manager().current_item().cloned()
    }

    fn now_playing(&self) -> Option<SharedItem> {
        self.manager().now_playing().cloned()
    }

    fn get_item_index(&self, item: &SharedItem) -> Option<usize> {
        self.manager().get_item_index(item)
    }

    fn has_prev(&self) -> bool {
        self.manager().has_prev()
    }

    fn detour(&mut self) {
        self.manager_mut().detour();
    }

    async fn finished(&mut self) -> Result<()> {
        self.manager_mut().finished().await
    }

    /// Repeat the current song once the player finishes it
    async fn repeat_song(&mut self) -> Result<()> {
        if self.state() == PlayState::Detour {
            self.manager()
                .events()
                .warn("already detouring, song will not repeat");
            return Ok(());
        }
        self.detour();
        Ok(())
    }

    async fn play_queue_item(&mut self, item: SharedItem) -> Result<()> {
        match self.get_item_index(&item) {
            Some(index) => self.play(index).await,
            None => {
                self.manager()
                    .events()
                    .warn(format!("item \"{}\" not in queue", item.title()));
                Ok(())
            }
        }
    }

    /// Remove `item`, returning the index it had
    async fn remove(&mut self, item: SharedItem) -> Result<Option<usize>> {
        let Some(index) = self.get_item_index(&item) else {
            return Ok(None);
        };
        self.remove_at(index).await?;
        Ok(Some(index))
    }

    async fn move_queue_item(&mut self, item: SharedItem, to: usize) -> Result<()> {
        let index = self
            .get_item_index(&item)
            .ok_or_else(|| QueueError::NotInQueue(item.title()))?;
        self.move_to(index, to).await
    }

    /// Drag-and-drop entry point; non-playable items are declined
    async fn handle_drop(
        &mut self,
        item: SharedItem,
        target: Option<usize>,
        is_outsider: bool,
    ) -> Result<bool> {
        if !item.is_playable() {
            return Ok(false);
        }

        let len = self.items().len();
        if is_outsider {
            let target = target.filter(|&t| t <= len).unwrap_or(len);
            self.insert(target, item).await?;
        } else {
            let target = target
                .filter(|&t| t <= len)
                .unwrap_or(len.saturating_sub(1));
            self.move_queue_item(item, target).await?;
        }
        Ok(true)
    }

    /// The player finished the current track
    async fn on_track_finished(&mut self) -> Result<()> {
        let attempts = self.manager().play_attempts();
        if self.has_next() || self.state() == PlayState::Detour {
            self.play_next().await?;
        }
        if self.manager().play_attempts() == attempts {
            self.finished().await?;
        }
        Ok(())
    }
}

/// Run `follow_up` against `queue`
pub(crate) async fn run_follow_up<Q: PlayQueue + ?Sized>(
    queue: &mut Q,
    follow_up: FollowUp,
) -> Result<()> {
    match follow_up {
        FollowUp::Nothing => Ok(()),
        FollowUp::PlayNext => queue.play_next().await,
        FollowUp::Play(index) => queue.play(index).await,
    }
}

#[async_trait]
impl PlayQueue for QueueManager {
    fn manager(&self) -> &QueueManager {
        self
    }

    fn manager_mut(&mut self) -> &mut QueueManager {
        self
    }

    async fn add(&mut self, items: Vec<SharedItem>) -> Result<()> {
        let follow_up = self.push_items(items);
        run_follow_up(self, follow_up).await
    }

    async fn insert(&mut self, index: usize, item: SharedItem) -> Result<()> {
        let follow_up = self.insert_item(index, item);
        run_follow_up(self, follow_up).await
    }

    async fn remove_at(&mut self, index: usize) -> Result<()> {
        let follow_up = self.remove_item(index);
        run_follow_up(self, follow_up).await
    }

    async fn move_to(&mut self, from: usize, to: usize) -> Result<()> {
        self.move_item(from, to);
        Ok(())
    }

    async fn play(&mut self, index: usize) -> Result<()> {
        QueueManager::play_at(self, index).await
    }

    async fn play_next(&mut self) -> Result<()> {
        if self.resume_detour().await? {
            return Ok(());
        }
        self.advance().await
    }

    async fn play_prev(&mut self) -> Result<()> {
        if self.resume_detour().await? {
            return Ok(());
        }
        self.retreat().await
    }

    fn has_next(&self) -> bool {
        QueueManager::has_next(self)
    }

    async fn reset(&mut self) -> Result<()> {
        self.clear();
        Ok(())
    }

    async fn detour_play(&mut self, item: SharedItem) -> Result<()> {
        self.play_item(&item).await;
        self.detour();
        Ok(())
    }
}
