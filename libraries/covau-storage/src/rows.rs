use covau_core::{DbId, DbMetadata, DbRow, Typ};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::{Result, StorageError};

pub(crate) const SELECT_COLUMNS: &str = "id, typ, data, metadata, ref_id";

pub(crate) fn decode(row: &SqliteRow) -> Result<DbRow> {
    let id: i64 = row.try_get("id")?;
    let typ: i64 = row.try_get("typ")?;
    let data: String = row.try_get("data")?;
    let metadata: String = row.try_get("metadata")?;

    Ok(DbRow {
        id: DbId::new(id),
        typ: Typ::from_i64(typ)
            .ok_or_else(|| StorageError::Corrupt(format!("row {} has unknown typ {}", id, typ)))?,
        metadata: serde_json::from_str::<DbMetadata>(&metadata)?,
        data: serde_json::from_str(&data)?,
        ref_id: row.try_get("ref_id")?,
    })
}
