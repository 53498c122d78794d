//! Covau Queue
//!
//! The play queue and everything layered on it:
//!
//! - [`QueueManager`]: ordered items, a play cursor and the
//!   `Unstarted / Playing / Detour / Finished` state machine
//! - [`AutoplayQueue`]: appends recommendations when the queue runs out,
//!   skipping blacklisted songs and artists
//! - [`LocalSyncQueue`]: persists the queue and blacklists to a covau database
//! - [`QueueHandle`]: the per-queue operation lock shared across tasks
//! - [`spawn_driver`]: advances a queue from player messages
//!
//! All layers implement [`PlayQueue`], so callers can drive any of them the
//! same way.
//!
//! # Example
//!
//! ```rust,no_run
//! use covau_queue::{PlayQueue, QueueEvents, QueueManager};
//! # async fn demo(player: std::sync::Arc<dyn covau_core::Player>, item: covau_core::SharedItem)
//! #     -> covau_queue::Result<()> {
//! let mut queue = QueueManager::new(player, QueueEvents::new());
//!
//! // Adding to an unstarted queue starts playback
//! queue.add(vec![item]).await?;
//! assert_eq!(queue.playing_index(), Some(0));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod autoplay;
pub mod blacklist;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod handle;
pub mod manager;
pub mod play_queue;
pub mod sync;

pub use autoplay::{AutoplayInfo, AutoplayQueue, AutoplayState};
pub use blacklist::{Blacklist, BlacklistChanges, TokenSet};
pub use config::QueueConfig;
pub use driver::spawn_driver;
pub use error::{QueueError, Result};
pub use events::{NotifyLevel, QueueEvent, QueueEvents};
pub use handle::QueueHandle;
pub use manager::{PlayState, QueueManager};
pub use play_queue::PlayQueue;
pub use sync::{LocalSyncQueue, SyncIds};
