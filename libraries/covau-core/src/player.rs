//! Player collaborator
//!
//! Covau never decodes audio itself. A [`Player`] is handed items to play and
//! reports back through [`PlayerMessage`]s delivered to registered handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use crate::error::Result;
use crate::types::SharedItem;

/// Notification emitted by a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum PlayerMessage {
    Paused,
    Unpaused,
    /// The current track ran to its end
    Finished,
    /// Started playing the given uri
    Playing(String),
    ProgressPerc(f64),
    Volume(f64),
    /// Duration of the current track in seconds
    Duration(f64),
    Mute(bool),
    Error(String),
}

/// Callback invoked for every player message
pub type MessageHandler = Box<dyn Fn(PlayerMessage) + Send + Sync>;

/// Plays list items
#[async_trait]
pub trait Player: Send + Sync {
    /// Resolve and start playing `item`
    async fn play_item(&self, item: &SharedItem) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn unpause(&self) -> Result<()>;

    async fn toggle_pause(&self) -> Result<()>;

    /// Seek to a fraction `0.0..=1.0` of the track
    async fn seek_to_perc(&self, perc: f64) -> Result<()>;

    /// Seek relative to the current position, in seconds
    async fn seek_by(&self, secs: f64) -> Result<()>;

    async fn set_volume(&self, volume: f64) -> Result<()>;

    async fn toggle_mute(&self) -> Result<()>;

    fn is_playing(&self) -> bool;

    fn is_finished(&self) -> bool;

    /// Progress through the current track as a fraction
    fn get_progress(&self) -> f64;

    /// Register a handler for player messages
    fn on_message(&self, handler: MessageHandler);
}

/// Ordered list of message handlers, for `Player` implementations
#[derive(Default)]
pub struct PlayerHandlers {
    handlers: Mutex<Vec<MessageHandler>>,
}

impl PlayerHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: MessageHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Deliver `message` to every handler in registration order
    pub fn emit(&self, message: &PlayerMessage) {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        for handler in handlers.iter() {
            handler(message.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PlayerHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandlers")
            .field("handlers", &self.len())
            .finish()
    }
}
