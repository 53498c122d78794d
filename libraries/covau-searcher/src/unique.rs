//! De-duplicating decorator

use async_trait::async_trait;
use covau_core::{Result, SearchSource, SharedItem};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Drops every item whose key was already yielded
pub struct Unique<S> {
    inner: S,
    seen: Mutex<HashSet<String>>,
}

impl<S> Unique<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of distinct keys yielded so far
    pub fn seen_count(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl<S: SearchSource> SearchSource for Unique<S> {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        let page = self.inner.next_page().await?;
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(page
            .into_iter()
            .filter(|item| seen.insert(item.key()))
            .collect())
    }

    fn has_next_page(&self) -> bool {
        self.inner.has_next_page()
    }
}
