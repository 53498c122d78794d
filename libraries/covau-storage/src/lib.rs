//! Covau Storage
//!
//! `SQLite` implementation of the covau [`Database`] plus a catalog over the
//! songs stored in it.
//!
//! # Architecture
//!
//! - **Document store**: every entity is one JSON row tagged with its `Typ`
//! - **Scoped transactions**: `begin` hands out a `TxnId`; writes go through it
//!   until `commit` or `rollback`
//! - **Local catalog**: [`LocalSourceFactory`] answers search, id, related and
//!   radio queries from the stored songs
//!
//! # Example
//!
//! ```rust,no_run
//! use covau_storage::{create_pool, run_migrations, SqliteDatabase};
//! use covau_core::{txn, Database, Song};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://covau.db").await?;
//! run_migrations(&pool).await?;
//!
//! let db: Arc<dyn Database> = Arc::new(SqliteDatabase::new(pool));
//! let song = Song { title: "Angel".to_string(), ..Default::default() };
//! let saved = txn(&db, |ops| async move { ops.insert_or_get(&song).await }).await?;
//! println!("saved as {}", saved.id);
//! # Ok(())
//! # }
//! ```
//!
//! [`Database`]: covau_core::Database

mod database;
mod error;
mod rows;
pub mod sources;

pub use database::SqliteDatabase;
pub use error::{Result, StorageError};
pub use sources::LocalSourceFactory;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    debug!("Migrations applied");
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://covau.db`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    info!("Opening database {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
