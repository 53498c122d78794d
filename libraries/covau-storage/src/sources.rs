//! Catalog over the songs stored in the local database

use async_trait::async_trait;
use covau_core::{
    Backend, CovauError, DbId, DbItem, SearchSource, SharedItem, Song, SongItem, SourceFactory,
    SourceQuery, Typ,
};
use covau_searcher::{Offset, OffsetFetcher, StaticSource};
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

use crate::error::StorageError;
use crate::rows::{decode, SELECT_COLUMNS};

/// Words that carry no meaning in a song search
const STOP_WORDS: [&str; 1] = ["by"];

/// [`SourceFactory`] answering queries for [`Backend::Local`] from stored songs
#[derive(Clone)]
pub struct LocalSourceFactory {
    pool: SqlitePool,
}

impl LocalSourceFactory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn song(&self, id: DbId) -> covau_core::Result<Option<DbItem<Song>>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM covau_objects WHERE id = ? AND typ = ?"
        ))
        .bind(id.get())
        .bind(Typ::Song.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;

        row.as_ref()
            .map(|row| DbItem::from_row(decode(row)?))
            .transpose()
    }
}

fn unsupported(query: &SourceQuery) -> CovauError {
    CovauError::UnsupportedQuery(format!("{:?}", query))
}

fn parse_id(id: &str) -> covau_core::Result<DbId> {
    id.parse::<i64>()
        .map(DbId::new)
        .map_err(|_| CovauError::invalid_input(format!("not a local song id: {}", id)))
}

fn to_items(rows: &[SqliteRow]) -> covau_core::Result<Vec<SharedItem>> {
    rows.iter()
        .map(|row| {
            let song = DbItem::<Song>::from_row(decode(row)?)?;
            Ok(Arc::new(SongItem::new(song)) as SharedItem)
        })
        .collect()
}

/// Search terms: words of the query, without separators and stop words
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .filter(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .map(|w| format!("%{}%", w))
        .collect()
}

#[async_trait]
impl SourceFactory for LocalSourceFactory {
    async fn open(
        &self,
        query: SourceQuery,
        page_size: usize,
    ) -> covau_core::Result<Box<dyn SearchSource>> {
        debug!("Opening local source for {:?}", query);
        match query {
            SourceQuery::Search {
                backend: Backend::Local,
                query,
            } => Ok(Box::new(Offset::new(
                TermSearch {
                    pool: self.pool.clone(),
                    terms: search_terms(&query),
                },
                page_size,
            ))),
            SourceQuery::Ids {
                backend: Backend::Local,
                ids,
            } => {
                let mut items: Vec<SharedItem> = Vec::with_capacity(ids.len());
                for id in &ids {
                    let id = parse_id(id)?;
                    let song = self
                        .song(id)
                        .await?
                        .ok_or_else(|| CovauError::not_found("song", id.to_string()))?;
                    items.push(Arc::new(SongItem::new(song)));
                }
                Ok(Box::new(StaticSource::new(items)))
            }
            SourceQuery::Related {
                backend: Backend::Local,
                id,
            } => {
                let id = parse_id(&id)?;
                let song = self
                    .song(id)
                    .await?
                    .ok_or_else(|| CovauError::not_found("song", id.to_string()))?;
                Ok(Box::new(Offset::new(
                    ArtistSongs {
                        pool: self.pool.clone(),
                        artists: song.t.artists,
                        exclude: Some(id),
                    },
                    page_size,
                )))
            }
            SourceQuery::Radio { query } => Ok(Box::new(Offset::new(
                ArtistSongs {
                    pool: self.pool.clone(),
                    artists: query
                        .split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string)
                        .collect(),
                    exclude: None,
                },
                page_size,
            ))),
            other => Err(unsupported(&other)),
        }
    }
}

/// Songs whose title or artists contain every term
struct TermSearch {
    pool: SqlitePool,
    terms: Vec<String>,
}

#[async_trait]
impl OffsetFetcher for TermSearch {
    async fn fetch_at(&self, offset: usize, limit: usize) -> covau_core::Result<Vec<SharedItem>> {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM covau_objects WHERE typ = ?");
        for _ in &self.terms {
            sql.push_str(
                " AND (json_extract(data, '$.title') LIKE ? OR json_extract(data, '$.artists') LIKE ?)",
            );
        }
        sql.push_str(" ORDER BY id LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql).bind(Typ::Song.as_i64());
        for term in &self.terms {
            query = query.bind(term).bind(term);
        }
        let rows = query
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        to_items(&rows)
    }
}

/// Songs crediting any of `artists`
struct ArtistSongs {
    pool: SqlitePool,
    artists: Vec<String>,
    exclude: Option<DbId>,
}

#[async_trait]
impl OffsetFetcher for ArtistSongs {
    async fn fetch_at(&self, offset: usize, limit: usize) -> covau_core::Result<Vec<SharedItem>> {
        if self.artists.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM covau_objects o
            WHERE o.typ = ?
              AND o.id != ?
              AND EXISTS (
                SELECT 1 FROM json_each(o.data, '$.artists') a
                WHERE a.value IN (SELECT value FROM json_each(?))
              )
            ORDER BY o.id
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(Typ::Song.as_i64())
        .bind(self.exclude.map_or(-1, |id| id.get()))
        .bind(serde_json::to_string(&self.artists)?)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;
        to_items(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_terms_drop_separators_and_stop_words() {
        assert_eq!(
            search_terms("Song by A, B"),
            ["%Song%", "%A%", "%B%"]
        );
        assert!(search_terms("  ").is_empty());
    }
}
