//! Shared access to a queue
//!
//! Queue operations take `&mut self`; a [`QueueHandle`] serialises them across
//! tasks so one operation completes before the next starts.

use async_trait::async_trait;
use covau_core::{DropHandler, SearchSource, SharedItem};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::play_queue::PlayQueue;

/// Per-queue operation lock
pub struct QueueHandle<Q> {
    inner: Arc<Mutex<Q>>,
}

impl<Q> Clone for QueueHandle<Q> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Q: PlayQueue> QueueHandle<Q> {
    pub fn new(queue: Q) -> Self {
        Self {
            inner: Arc::new(Mutex::new(queue)),
        }
    }

    /// Wait for exclusive access
    pub async fn lock(&self) -> MutexGuard<'_, Q> {
        self.inner.lock().await
    }
}

#[async_trait]
impl<Q: PlayQueue> SearchSource for QueueHandle<Q> {
    async fn next_page(&self) -> covau_core::Result<Vec<SharedItem>> {
        self.inner.lock().await.next_page().await
    }

    fn has_next_page(&self) -> bool {
        // a busy queue is about to change
        self.inner
            .try_lock()
            .map_or(true, |queue| queue.has_next_page())
    }
}

#[async_trait]
impl<Q: PlayQueue> DropHandler for QueueHandle<Q> {
    async fn handle_drop(
        &self,
        item: SharedItem,
        target: usize,
        is_outsider: bool,
    ) -> covau_core::Result<bool> {
        let mut queue = self.inner.lock().await;
        Ok(queue.handle_drop(item, Some(target), is_outsider).await?)
    }

    async fn remove(&self, item: SharedItem) -> covau_core::Result<Option<usize>> {
        let mut queue = self.inner.lock().await;
        Ok(queue.remove(item).await?)
    }
}
