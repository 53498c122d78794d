//! `SQLite` document store

use async_trait::async_trait;
use covau_core::{
    CovauError, Database, DbEntity, DbId, DbMetadata, DbRow, InsertResponse, TxnId,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::StorageError;
use crate::rows::{decode, SELECT_COLUMNS};

type OpenTxn = Arc<Mutex<Transaction<'static, Sqlite>>>;

/// [`Database`] over a `SQLite` pool
///
/// Each open transaction holds one pooled connection until it is committed or
/// rolled back. Reads through [`Database::get`] see committed data only.
pub struct SqliteDatabase {
    pool: SqlitePool,
    txns: Mutex<HashMap<TxnId, OpenTxn>>,
}

impl SqliteDatabase {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            txns: Mutex::new(HashMap::new()),
        }
    }

    /// Open `database_url` and bring its schema up to date
    pub async fn connect(database_url: &str) -> crate::Result<Self> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn open(&self, txn: TxnId) -> Result<OpenTxn, StorageError> {
        self.txns
            .lock()
            .await
            .get(&txn)
            .cloned()
            .ok_or(StorageError::UnknownTransaction(txn))
    }

    async fn finish(&self, txn: TxnId) -> Result<Transaction<'static, Sqlite>, StorageError> {
        let open = self
            .txns
            .lock()
            .await
            .remove(&txn)
            .ok_or(StorageError::UnknownTransaction(txn))?;
        // statements hold the lock only while they run
        let tx = Arc::try_unwrap(open)
            .map_err(|_| StorageError::Corrupt(format!("transaction {} still in use", txn)))?;
        Ok(tx.into_inner())
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn begin(&self) -> covau_core::Result<TxnId> {
        let tx = self.pool.begin().await.map_err(StorageError::from)?;
        let id = TxnId::generate();
        self.txns.lock().await.insert(id, Arc::new(Mutex::new(tx)));
        trace!("Began transaction {}", id);
        Ok(id)
    }

    async fn commit(&self, txn: TxnId) -> covau_core::Result<()> {
        let tx = self.finish(txn).await?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn rollback(&self, txn: TxnId) -> covau_core::Result<()> {
        let tx = self.finish(txn).await?;
        tx.rollback().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn insert_or_get(
        &self,
        txn: TxnId,
        entity: DbEntity,
    ) -> covau_core::Result<InsertResponse> {
        let open = self.open(txn).await?;
        let mut tx = open.lock().await;

        if let Some(ref_id) = &entity.ref_id {
            let existing = sqlx::query(&format!(
                "SELECT {SELECT_COLUMNS} FROM covau_objects WHERE typ = ? AND ref_id = ?"
            ))
            .bind(entity.typ.as_i64())
            .bind(ref_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(StorageError::from)?;

            if let Some(row) = existing {
                return Ok(InsertResponse::Old(decode(&row)?));
            }
        }

        let metadata = DbMetadata::default();
        let result = sqlx::query(
            "INSERT INTO covau_objects (typ, data, metadata, ref_id) VALUES (?, ?, ?, ?)",
        )
        .bind(entity.typ.as_i64())
        .bind(serde_json::to_string(&entity.data)?)
        .bind(serde_json::to_string(&metadata)?)
        .bind(&entity.ref_id)
        .execute(&mut **tx)
        .await
        .map_err(StorageError::from)?;

        let id = DbId::new(result.last_insert_rowid());
        debug!("Inserted {:?} {}", entity.typ, id);
        Ok(InsertResponse::New(DbRow {
            id,
            typ: entity.typ,
            metadata,
            data: entity.data,
            ref_id: entity.ref_id,
        }))
    }

    async fn update(&self, txn: TxnId, row: &DbRow) -> covau_core::Result<()> {
        let open = self.open(txn).await?;
        let mut tx = open.lock().await;

        let result = sqlx::query(
            "UPDATE covau_objects SET data = ?, ref_id = ? WHERE id = ? AND typ = ?",
        )
        .bind(serde_json::to_string(&row.data)?)
        .bind(&row.ref_id)
        .bind(row.id.get())
        .bind(row.typ.as_i64())
        .execute(&mut **tx)
        .await
        .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(CovauError::not_found(format!("{:?}", row.typ), row.id.to_string()));
        }
        Ok(())
    }

    async fn update_metadata(
        &self,
        txn: TxnId,
        id: DbId,
        metadata: DbMetadata,
    ) -> covau_core::Result<DbMetadata> {
        let open = self.open(txn).await?;
        let mut tx = open.lock().await;

        let stored: Option<String> =
            sqlx::query_scalar("SELECT metadata FROM covau_objects WHERE id = ?")
                .bind(id.get())
                .fetch_optional(&mut **tx)
                .await
                .map_err(StorageError::from)?;
        let stored: DbMetadata = match stored {
            Some(json) => serde_json::from_str(&json)?,
            None => return Err(CovauError::not_found("item", id.to_string())),
        };

        if stored.update_counter != metadata.update_counter {
            return Err(CovauError::Conflict(id));
        }

        let updated = DbMetadata {
            update_counter: metadata.update_counter + 1,
            ..metadata
        };
        sqlx::query("UPDATE covau_objects SET metadata = ? WHERE id = ?")
            .bind(serde_json::to_string(&updated)?)
            .bind(id.get())
            .execute(&mut **tx)
            .await
            .map_err(StorageError::from)?;
        Ok(updated)
    }

    async fn delete(&self, txn: TxnId, id: DbId) -> covau_core::Result<()> {
        let open = self.open(txn).await?;
        let mut tx = open.lock().await;

        let result = sqlx::query("DELETE FROM covau_objects WHERE id = ?")
            .bind(id.get())
            .execute(&mut **tx)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(CovauError::not_found("item", id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: DbId) -> covau_core::Result<Option<DbRow>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM covau_objects WHERE id = ?"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(row.as_ref().map(decode).transpose()?)
    }
}
