//! Call coalescing decorator

use async_trait::async_trait;
use covau_core::{Result, SearchSource, SharedItem};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::trace;

use crate::saved::ItemList;

#[derive(Default)]
struct Settled {
    generation: u64,
    last: Vec<SharedItem>,
}

/// Coalesces concurrent `next_page` calls into one fetch
///
/// A caller arriving while a fetch is pending waits for it and receives the
/// same page. A failed fetch is not shared: the waiter then fetches itself.
pub struct Debounced<S> {
    inner: S,
    settled: Mutex<Settled>,
    completed: AtomicU64,
}

impl<S> Debounced<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            settled: Mutex::new(Settled::default()),
            completed: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ItemList> ItemList for Debounced<S> {
    fn with_items<R>(&self, f: impl FnOnce(&mut Vec<SharedItem>) -> R) -> R {
        self.inner.with_items(f)
    }
}

#[async_trait]
impl<S: SearchSource> SearchSource for Debounced<S> {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        let ticket = self.completed.load(Ordering::Acquire);

        let mut settled = match self.settled.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                let guard = self.settled.lock().await;
                if guard.generation > ticket {
                    trace!("Joined pending fetch (generation {})", guard.generation);
                    return Ok(guard.last.clone());
                }
                guard
            }
        };

        let page = self.inner.next_page().await?;
        settled.generation += 1;
        settled.last.clone_from(&page);
        self.completed.store(settled.generation, Ordering::Release);
        Ok(page)
    }

    fn has_next_page(&self) -> bool {
        self.inner.has_next_page()
    }
}
