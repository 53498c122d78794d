//! Database collaborator
//!
//! All writes happen inside an explicit transaction identified by a [`TxnId`].
//! [`txn`] scopes one: it commits when the closure succeeds and rolls back
//! when it fails.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{CovauError, Result};
use crate::types::{DbAble, DbEntity, DbId, DbItem, DbMetadata, DbRow, InsertResponse, TxnId};

/// Transactional entity store
#[async_trait]
pub trait Database: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> Result<TxnId>;

    async fn commit(&self, txn: TxnId) -> Result<()>;

    async fn rollback(&self, txn: TxnId) -> Result<()>;

    /// Insert `entity`, or return the existing row with the same typ and ref id
    async fn insert_or_get(&self, txn: TxnId, entity: DbEntity) -> Result<InsertResponse>;

    /// Overwrite the data of an existing row
    async fn update(&self, txn: TxnId, row: &DbRow) -> Result<()>;

    /// Overwrite metadata if `metadata.update_counter` matches the stored one
    ///
    /// # Errors
    /// Returns `CovauError::Conflict` when the counter is stale
    async fn update_metadata(&self, txn: TxnId, id: DbId, metadata: DbMetadata)
        -> Result<DbMetadata>;

    async fn delete(&self, txn: TxnId, id: DbId) -> Result<()>;

    async fn get(&self, id: DbId) -> Result<Option<DbRow>>;
}

/// Typed operations bound to one open transaction
#[derive(Clone)]
pub struct DbOps {
    db: Arc<dyn Database>,
    id: TxnId,
}

impl DbOps {
    pub fn new(db: Arc<dyn Database>, id: TxnId) -> Self {
        Self { db, id }
    }

    pub fn txn_id(&self) -> TxnId {
        self.id
    }

    pub async fn insert_or_get<T: DbAble>(&self, t: &T) -> Result<DbItem<T>> {
        let row = self
            .db
            .insert_or_get(self.id, t.to_entity()?)
            .await?
            .into_row();
        DbItem::from_row(row)
    }

    pub async fn update<T: DbAble>(&self, item: &DbItem<T>) -> Result<()> {
        self.db.update(self.id, &item.to_row()?).await
    }

    /// Write `item`'s metadata back, returning it with the bumped counter
    pub async fn update_metadata<T: DbAble>(&self, item: &DbItem<T>) -> Result<DbMetadata> {
        self.db
            .update_metadata(self.id, item.id, item.metadata.clone())
            .await
    }

    pub async fn delete<T: DbAble>(&self, item: &DbItem<T>) -> Result<()> {
        self.db.delete(self.id, item.id).await
    }

    pub async fn get<T: DbAble>(&self, id: DbId) -> Result<Option<DbItem<T>>> {
        get(self.db.as_ref(), id).await
    }
}

impl std::fmt::Debug for DbOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbOps").field("id", &self.id).finish()
    }
}

/// Typed read outside of a transaction
pub async fn get<T: DbAble>(db: &dyn Database, id: DbId) -> Result<Option<DbItem<T>>> {
    db.get(id).await?.map(DbItem::from_row).transpose()
}

/// Run `f` inside a transaction
///
/// Commits when `f` returns `Ok`, rolls back and returns the error otherwise.
pub async fn txn<T, E, F, Fut>(db: &Arc<dyn Database>, f: F) -> std::result::Result<T, E>
where
    F: FnOnce(DbOps) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: From<CovauError>,
{
    let id = db.begin().await?;
    debug!("Transaction {} started", id);

    match f(DbOps::new(db.clone(), id)).await {
        Ok(value) => {
            db.commit(id).await?;
            debug!("Transaction {} committed", id);
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = db.rollback(id).await {
                warn!("Rollback of transaction {} failed: {}", id, rollback_err);
            } else {
                debug!("Transaction {} rolled back", id);
            }
            Err(e)
        }
    }
}
