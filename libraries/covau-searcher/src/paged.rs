//! Continuation adapters for remote APIs
//!
//! [`Paged`] drives APIs addressed by page number, [`Offset`] those addressed
//! by item offset. Both stop calling their fetcher once exhausted.

use async_trait::async_trait;
use covau_core::{Result, SearchSource, SharedItem};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// One page from a [`PageFetcher`]
#[derive(Debug, Default)]
pub struct Page {
    pub items: Vec<SharedItem>,
    pub has_next: bool,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the zero-based page `page`
    async fn fetch_page(&self, page: usize, page_size: usize) -> Result<Page>;
}

#[async_trait]
pub trait OffsetFetcher: Send + Sync {
    /// Fetch at most `limit` items starting at `offset`
    async fn fetch_at(&self, offset: usize, limit: usize) -> Result<Vec<SharedItem>>;
}

/// Page-number continuation
pub struct Paged<F> {
    fetcher: F,
    page_size: usize,
    next: Mutex<usize>,
    has_next: AtomicBool,
}

impl<F: PageFetcher> Paged<F> {
    pub fn new(fetcher: F, page_size: usize) -> Self {
        Self {
            fetcher,
            page_size,
            next: Mutex::new(0),
            has_next: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl<F: PageFetcher> SearchSource for Paged<F> {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        let mut next = self.next.lock().await;
        if !self.has_next_page() {
            return Ok(Vec::new());
        }

        let page = self.fetcher.fetch_page(*next, self.page_size).await?;
        *next += 1;
        if !page.has_next || page.items.is_empty() {
            debug!("Paged source exhausted after {} pages", *next);
            self.has_next.store(false, Ordering::Release);
        }
        Ok(page.items)
    }

    fn has_next_page(&self) -> bool {
        self.has_next.load(Ordering::Acquire)
    }
}

/// Item-offset continuation
///
/// A short page (fewer than `page_size` items) marks the end.
pub struct Offset<F> {
    fetcher: F,
    page_size: usize,
    offset: Mutex<usize>,
    has_next: AtomicBool,
}

impl<F: OffsetFetcher> Offset<F> {
    pub fn new(fetcher: F, page_size: usize) -> Self {
        Self {
            fetcher,
            page_size,
            offset: Mutex::new(0),
            has_next: AtomicBool::new(page_size > 0),
        }
    }
}

#[async_trait]
impl<F: OffsetFetcher> SearchSource for Offset<F> {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        let mut offset = self.offset.lock().await;
        if !self.has_next_page() {
            return Ok(Vec::new());
        }

        let items = self.fetcher.fetch_at(*offset, self.page_size).await?;
        *offset += items.len();
        if items.len() < self.page_size {
            debug!("Offset source exhausted at {}", *offset);
            self.has_next.store(false, Ordering::Release);
        }
        Ok(items)
    }

    fn has_next_page(&self) -> bool {
        self.has_next.load(Ordering::Acquire)
    }
}
