/// Core traits for Covau
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::types::{Backend, SharedItem};

/// Paginated source of list items
///
/// Receivers are `&self` so the same source can be polled from several tasks;
/// implementations guard their own continuation state.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Fetch the next page
    ///
    /// Once [`SearchSource::has_next_page`] is false this returns an empty page.
    async fn next_page(&self) -> Result<Vec<SharedItem>>;

    /// Whether another page may still arrive
    fn has_next_page(&self) -> bool;
}

#[async_trait]
impl<S: SearchSource + ?Sized> SearchSource for Box<S> {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        (**self).next_page().await
    }

    fn has_next_page(&self) -> bool {
        (**self).has_next_page()
    }
}

#[async_trait]
impl<S: SearchSource + ?Sized> SearchSource for Arc<S> {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        (**self).next_page().await
    }

    fn has_next_page(&self) -> bool {
        (**self).has_next_page()
    }
}

/// What a [`SourceFactory`] should open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum SourceQuery {
    /// Free text search
    Search { backend: Backend, query: String },
    /// Batch lookup by backend ids
    Ids { backend: Backend, ids: Vec<String> },
    /// Items related to the item with the given backend id
    Related { backend: Backend, id: String },
    /// Radio built from free text (usually artist names)
    Radio { query: String },
}

/// Opens raw paginated sources for queries
#[async_trait]
pub trait SourceFactory: Send + Sync {
    /// Open a source that yields pages of `page_size` items
    ///
    /// # Errors
    /// Returns `CovauError::UnsupportedQuery` for backends this factory cannot reach
    async fn open(&self, query: SourceQuery, page_size: usize) -> Result<Box<dyn SearchSource>>;
}

/// Decides drag-and-drop edits on a list
#[async_trait]
pub trait DropHandler: Send + Sync {
    /// Accept or decline dropping `item` at `target`
    ///
    /// `is_outsider` is true when the item comes from another list.
    async fn handle_drop(&self, item: SharedItem, target: usize, is_outsider: bool)
        -> Result<bool>;

    /// Remove `item`, returning the index it was removed from
    async fn remove(&self, item: SharedItem) -> Result<Option<usize>>;
}

#[async_trait]
impl<D: DropHandler + ?Sized> DropHandler for Arc<D> {
    async fn handle_drop(
        &self,
        item: SharedItem,
        target: usize,
        is_outsider: bool,
    ) -> Result<bool> {
        (**self).handle_drop(item, target, is_outsider).await
    }

    async fn remove(&self, item: SharedItem) -> Result<Option<usize>> {
        (**self).remove(item).await
    }
}
