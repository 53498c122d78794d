//! Base sources that decorators wrap

use async_trait::async_trait;
use covau_core::{Result, SearchSource, SharedItem};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;

use crate::saved::ItemList;

/// Source with a fixed list, yielded as a single page
pub struct StaticSource {
    items: Mutex<Vec<SharedItem>>,
    yielded: AtomicBool,
}

impl StaticSource {
    pub fn new(items: Vec<SharedItem>) -> Self {
        Self {
            items: Mutex::new(items),
            yielded: AtomicBool::new(false),
        }
    }
}

impl ItemList for StaticSource {
    fn with_items<R>(&self, f: impl FnOnce(&mut Vec<SharedItem>) -> R) -> R {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut items)
    }
}

#[async_trait]
impl SearchSource for StaticSource {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        if self.yielded.swap(true, Ordering::AcqRel) {
            return Ok(Vec::new());
        }
        Ok(self.items())
    }

    fn has_next_page(&self) -> bool {
        !self.yielded.load(Ordering::Acquire)
    }
}

type Loader = Box<
    dyn FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<Vec<SharedItem>>> + Send>>
        + Send,
>;

/// Source whose single page is computed by an async loader on first use
pub struct AsyncStaticSource {
    loader: AsyncMutex<Option<Loader>>,
    items: Mutex<Vec<SharedItem>>,
    yielded: AtomicBool,
}

impl AsyncStaticSource {
    pub fn new<F, Fut>(load: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<SharedItem>>> + Send + 'static,
    {
        let loader: Loader = Box::new(move || Box::pin(load()));
        Self {
            loader: AsyncMutex::new(Some(loader)),
            items: Mutex::new(Vec::new()),
            yielded: AtomicBool::new(false),
        }
    }
}

impl ItemList for AsyncStaticSource {
    fn with_items<R>(&self, f: impl FnOnce(&mut Vec<SharedItem>) -> R) -> R {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut items)
    }
}

#[async_trait]
impl SearchSource for AsyncStaticSource {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        let mut loader = self.loader.lock().await;
        let Some(load) = loader.take() else {
            return Ok(Vec::new());
        };
        // the loader runs once, even when it fails
        let loaded = load().await;
        self.yielded.store(true, Ordering::Release);
        let items = loaded?;
        self.with_items(|list| list.clone_from(&items));
        Ok(items)
    }

    fn has_next_page(&self) -> bool {
        !self.yielded.load(Ordering::Acquire)
    }
}

/// Always empty, already exhausted
#[derive(Debug, Default, Clone, Copy)]
pub struct Fused;

#[async_trait]
impl SearchSource for Fused {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        Ok(Vec::new())
    }

    fn has_next_page(&self) -> bool {
        false
    }
}
