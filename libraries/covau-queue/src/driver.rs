//! Feeds player messages into a queue

use covau_core::{Player, PlayerMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::handle::QueueHandle;
use crate::play_queue::PlayQueue;

/// Register with `player` and advance `queue` whenever a track finishes
///
/// The task ends once the player drops its handlers.
pub fn spawn_driver<Q>(queue: QueueHandle<Q>, player: &dyn Player) -> JoinHandle<()>
where
    Q: PlayQueue + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    player.on_message(Box::new(move |message| {
        // receiver gone means the driver stopped
        let _ = tx.send(message);
    }));

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                PlayerMessage::Finished => {
                    let mut queue = queue.lock().await;
                    if let Err(e) = queue.on_track_finished().await {
                        error!("Failed to advance queue: {}", e);
                    }
                }
                PlayerMessage::Error(message) => {
                    let queue = queue.lock().await;
                    queue.manager().events().warn(message);
                }
                PlayerMessage::Playing(uri) => debug!("Player started {}", uri),
                other => trace!("Player message: {:?}", other),
            }
        }
        debug!("Player message channel closed");
    })
}
