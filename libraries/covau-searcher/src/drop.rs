//! Drag-and-drop decorator

use async_trait::async_trait;
use covau_core::{CovauError, DropHandler, Result, SearchSource, SharedItem};
use std::sync::Arc;
use tracing::debug;

use crate::saved::ItemList;

/// Lets an injected [`DropHandler`] edit an accumulated list
///
/// Without a handler every drop is declined and nothing is removed.
pub struct Droppable<S> {
    inner: S,
    handler: Option<Arc<dyn DropHandler>>,
}

impl<S> Droppable<S> {
    pub fn new(inner: S, handler: Option<Arc<dyn DropHandler>>) -> Self {
        Self { inner, handler }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ItemList> Droppable<S> {
    /// Position of `item` in the local list
    pub fn get_item_index(&self, item: &SharedItem) -> Option<usize> {
        let key = item.key();
        self.inner
            .with_items(|items| items.iter().position(|i| i.key() == key))
    }

    /// Drop `item` at `target`
    ///
    /// `target` defaults to the end of the list for outsiders and to the last
    /// slot for items already in the list.
    ///
    /// # Errors
    /// `CovauError::Duplicate` when an accepted outsider is already listed,
    /// `CovauError::NotInList` when an accepted internal move cannot find its item
    pub async fn handle_drop(
        &self,
        item: SharedItem,
        target: Option<usize>,
        is_outsider: bool,
    ) -> Result<bool> {
        let Some(handler) = &self.handler else {
            return Ok(false);
        };

        let len = self.inner.with_items(|items| items.len());
        let target = target.unwrap_or(if is_outsider {
            len
        } else {
            len.saturating_sub(1)
        });

        if !handler.handle_drop(item.clone(), target, is_outsider).await? {
            return Ok(false);
        }

        debug!(
            "Drop accepted: {} -> {} (outsider: {})",
            item.key(),
            target,
            is_outsider
        );
        if is_outsider {
            self.insert(target, item)?;
        } else {
            self.move_item(&item, target)?;
        }
        Ok(true)
    }

    /// Remove `item` through the handler, mirroring it locally
    pub async fn remove(&self, item: SharedItem) -> Result<Option<usize>> {
        let Some(handler) = &self.handler else {
            return Ok(None);
        };

        let index = handler.remove(item).await?;
        if let Some(index) = index {
            self.inner.with_items(|items| {
                if index < items.len() {
                    items.remove(index);
                }
            });
        }
        Ok(index)
    }

    fn insert(&self, index: usize, item: SharedItem) -> Result<()> {
        let key = item.key();
        self.inner.with_items(|items| {
            if items.iter().any(|i| i.key() == key) {
                return Err(CovauError::Duplicate(item.title()));
            }
            let index = index.min(items.len());
            items.insert(index, item);
            Ok(())
        })
    }

    fn move_item(&self, item: &SharedItem, to: usize) -> Result<()> {
        let key = item.key();
        self.inner.with_items(|items| {
            let from = items
                .iter()
                .position(|i| i.key() == key)
                .ok_or_else(|| CovauError::NotInList(item.title()))?;
            let moved = items.remove(from);
            let to = to.min(items.len());
            items.insert(to, moved);
            Ok(())
        })
    }
}

impl<S: ItemList> ItemList for Droppable<S> {
    fn with_items<R>(&self, f: impl FnOnce(&mut Vec<SharedItem>) -> R) -> R {
        self.inner.with_items(f)
    }
}

#[async_trait]
impl<S: SearchSource> SearchSource for Droppable<S> {
    async fn next_page(&self) -> Result<Vec<SharedItem>> {
        self.inner.next_page().await
    }

    fn has_next_page(&self) -> bool {
        self.inner.has_next_page()
    }
}
