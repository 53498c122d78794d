//! Accumulating decorator

use async_trait::async_trait;
use covau_core::{Result, SearchSource, SharedItem};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;

/// A source that keeps the items it has yielded, editable in place
pub trait ItemList {
    /// Run `f` with mutable access to the accumulated items
    fn with_items<R>(&self, f: impl FnOnce(&mut Vec<SharedItem>) -> R) -> R;

    /// Snapshot of the accumulated items
    fn items(&self) -> Vec<SharedItem> {
        self.with_items(|items| items.clone())
    }
}

/// Appends every page to an accumulated list and yields the whole list
pub struct Saved<S> {
    inner: S,
    op: AsyncMutex<()>,
    items: Mutex<Vec<SharedItem>>,
}

impl<S> Saved<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            op: AsyncMutex::new(()),
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> ItemList for Saved<S> {
    fn with_items<R>(&self, f: impl FnOnce(&mut Vec<SharedItem>) -> R) -> R {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut items)
    }
}

#[async_trait]
impl<S: SearchSource> SearchSource for Saved<S> {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        let _op = self.op.lock().await;
        let page = self.inner.next_page().await?;
        Ok(self.with_items(|items| {
            items.extend(page);
            items.clone()
        }))
    }

    fn has_next_page(&self) -> bool {
        self.inner.has_next_page()
    }
}
