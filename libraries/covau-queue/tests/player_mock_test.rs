//! Queue behaviour against a mocked player

use async_trait::async_trait;
use covau_core::{
    AutoplayKind, AutoplayQuery, CovauError, InfoSource, ListItem, MessageHandler, PlaySource,
    Player, SharedItem,
};
use covau_queue::{PlayQueue, PlayState, QueueEvents, QueueManager};
use mockall::mock;
use std::sync::Arc;

// ===== Helpers =====

mock! {
    pub Speaker {}

    #[async_trait]
    impl Player for Speaker {
        async fn play_item(&self, item: &SharedItem) -> covau_core::Result<()>;
        async fn pause(&self) -> covau_core::Result<()>;
        async fn unpause(&self) -> covau_core::Result<()>;
        async fn toggle_pause(&self) -> covau_core::Result<()>;
        async fn seek_to_perc(&self, perc: f64) -> covau_core::Result<()>;
        async fn seek_by(&self, secs: f64) -> covau_core::Result<()>;
        async fn set_volume(&self, volume: f64) -> covau_core::Result<()>;
        async fn toggle_mute(&self) -> covau_core::Result<()>;
        fn is_playing(&self) -> bool;
        fn is_finished(&self) -> bool;
        fn get_progress(&self) -> f64;
        fn on_message(&self, handler: MessageHandler);
    }
}

#[derive(Debug)]
struct Track(&'static str);

#[async_trait]
impl ListItem for Track {
    fn key(&self) -> String {
        self.0.to_string()
    }

    fn title(&self) -> String {
        self.0.to_string()
    }

    fn is_playable(&self) -> bool {
        true
    }

    fn song_ids(&self) -> Vec<InfoSource> {
        Vec::new()
    }

    fn artist_ids(&self) -> Vec<InfoSource> {
        Vec::new()
    }

    async fn resolve_stream_uri(&self) -> covau_core::Result<Option<PlaySource>> {
        Ok(None)
    }

    async fn autoplay_query(
        &self,
        _kind: AutoplayKind,
    ) -> covau_core::Result<Option<AutoplayQuery>> {
        Ok(None)
    }
}

fn track(key: &'static str) -> SharedItem {
    Arc::new(Track(key))
}

fn queue(player: MockSpeaker) -> QueueManager {
    QueueManager::new(Arc::new(player), QueueEvents::new())
}

// ===== Tests =====

#[tokio::test]
async fn test_finishing_pauses_player_once() {
    let mut player = MockSpeaker::new();
    player.expect_play_item().times(1).returning(|_| Ok(()));
    player.expect_pause().times(1).returning(|| Ok(()));

    let mut queue = queue(player);
    queue.add(vec![track("a")]).await.unwrap();
    queue.on_track_finished().await.unwrap();
    queue.on_track_finished().await.unwrap();

    assert_eq!(queue.state(), PlayState::Finished);
}

#[tokio::test]
async fn test_player_error_leaves_queue_playing() {
    let mut player = MockSpeaker::new();
    player
        .expect_play_item()
        .returning(|item| Err(CovauError::player(format!("no device for {}", item.key()))));

    let mut queue = queue(player);
    let mut rx = queue.events().subscribe();
    queue.add(vec![track("a")]).await.unwrap();

    assert_eq!(queue.state(), PlayState::Playing);
    assert_eq!(queue.playing_index(), Some(0));
    assert!(queue.now_playing().is_none());
    let mut warned = false;
    while let Ok(event) = rx.try_recv() {
        if let covau_queue::QueueEvent::Notify { message, .. } = event {
            warned |= message.contains("no device for a");
        }
    }
    assert!(warned);
}

#[tokio::test]
async fn test_failed_start_does_not_finish_queue() {
    let mut player = MockSpeaker::new();
    let mut attempts = 0;
    player.expect_play_item().returning(move |_| {
        attempts += 1;
        if attempts == 1 {
            Ok(())
        } else {
            Err(CovauError::player("gone"))
        }
    });
    player.expect_pause().times(0);

    let mut queue = queue(player);
    queue.add(vec![track("a"), track("b")]).await.unwrap();

    // b was attempted, so the queue is not finished even though it failed
    queue.on_track_finished().await.unwrap();
    assert_eq!(queue.playing_index(), Some(1));
    assert_eq!(queue.state(), PlayState::Playing);
}

#[tokio::test]
async fn test_sync_play_adopts_item_and_keeps_pause_state() {
    let mut player = MockSpeaker::new();
    player.expect_is_playing().return_const(false);
    player.expect_is_finished().return_const(false);
    player.expect_play_item().times(1).returning(|_| Ok(()));
    player.expect_pause().times(1).returning(|| Ok(()));

    let mut queue = queue(player);
    queue.sync_play(track("a")).await.unwrap();
    // already the current item, nothing to do
    queue.sync_play(track("a")).await.unwrap();

    assert_eq!(queue.now_playing().unwrap().key(), "a");
    assert_eq!(queue.state(), PlayState::Playing);
}
