//! Persisted covau entities
//!
//! Everything the queue persists is stored as a JSON document tagged with a
//! [`Typ`]. [`DbRow`] is the untyped row a `Database` hands back, [`DbItem`]
//! the typed view of it.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::ids::{DbId, InfoSource, PlaySource};
use crate::error::{CovauError, Result};

/// Closed set of entity kinds a database stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Typ {
    Song,
    Playlist,
    Queue,
    ArtistBlacklist,
    SongBlacklist,
    Updater,
    StSong,
    StVideo,
    StAlbum,
    StPlaylist,
    StArtist,
    MbzRecording,
    MbzRelease,
    MbzReleaseGroup,
    MbzArtist,
}

impl Typ {
    const ALL: [Typ; 15] = [
        Typ::Song,
        Typ::Playlist,
        Typ::Queue,
        Typ::ArtistBlacklist,
        Typ::SongBlacklist,
        Typ::Updater,
        Typ::StSong,
        Typ::StVideo,
        Typ::StAlbum,
        Typ::StPlaylist,
        Typ::StArtist,
        Typ::MbzRecording,
        Typ::MbzRelease,
        Typ::MbzReleaseGroup,
        Typ::MbzArtist,
    ];

    /// Stable numeric tag used in storage
    pub fn as_i64(self) -> i64 {
        match self {
            Typ::Song => 1,
            Typ::Playlist => 2,
            Typ::Queue => 3,
            Typ::ArtistBlacklist => 4,
            Typ::SongBlacklist => 5,
            Typ::Updater => 6,
            Typ::StSong => 7,
            Typ::StVideo => 8,
            Typ::StAlbum => 9,
            Typ::StPlaylist => 10,
            Typ::StArtist => 11,
            Typ::MbzRecording => 12,
            Typ::MbzRelease => 13,
            Typ::MbzReleaseGroup => 14,
            Typ::MbzArtist => 15,
        }
    }

    /// Inverse of [`Typ::as_i64`]
    pub fn from_i64(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_i64() == value)
    }
}

/// Bookkeeping stored next to every entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbMetadata {
    pub done: bool,
    pub likes: i32,
    pub dislikes: i32,
    pub interactions: i32,
    /// Bumped on every metadata write, used for optimistic concurrency
    pub update_counter: i32,
}

/// Untyped stored entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRow {
    pub id: DbId,
    pub typ: Typ,
    pub metadata: DbMetadata,
    pub data: serde_json::Value,
    pub ref_id: Option<String>,
}

/// Insert payload: an entity that has no id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbEntity {
    pub typ: Typ,
    pub data: serde_json::Value,
    /// Secondary identity; rows of the same typ sharing it are the same entity
    pub ref_id: Option<String>,
}

/// Outcome of `Database::insert_or_get`
#[derive(Debug, Clone, PartialEq)]
pub enum InsertResponse {
    New(DbRow),
    Old(DbRow),
}

impl InsertResponse {
    pub fn is_new(&self) -> bool {
        matches!(self, InsertResponse::New(_))
    }

    pub fn into_row(self) -> DbRow {
        match self {
            InsertResponse::New(row) | InsertResponse::Old(row) => row,
        }
    }
}

/// Types that can be stored as a covau entity
pub trait DbAble: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn typ() -> Typ;

    fn ref_id(&self) -> Option<String> {
        None
    }

    fn to_entity(&self) -> Result<DbEntity> {
        Ok(DbEntity {
            typ: Self::typ(),
            data: serde_json::to_value(self)?,
            ref_id: self.ref_id(),
        })
    }
}

/// Typed view of a stored entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbItem<T> {
    pub id: DbId,
    pub typ: Typ,
    pub metadata: DbMetadata,
    pub t: T,
}

impl<T: DbAble> DbItem<T> {
    /// Parse a row, checking that it holds a `T`
    pub fn from_row(row: DbRow) -> Result<Self> {
        if row.typ != T::typ() {
            return Err(CovauError::invalid_input(format!(
                "expected {:?} row, got {:?} (id {})",
                T::typ(),
                row.typ,
                row.id
            )));
        }
        Ok(Self {
            id: row.id,
            typ: row.typ,
            metadata: row.metadata,
            t: serde_json::from_value(row.data)?,
        })
    }

    pub fn to_row(&self) -> Result<DbRow> {
        Ok(DbRow {
            id: self.id,
            typ: self.typ,
            metadata: self.metadata.clone(),
            data: serde_json::to_value(&self.t)?,
            ref_id: self.t.ref_id(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artists: Vec<String>,
    pub thumbnails: Vec<String>,
    pub info_sources: Vec<InfoSource>,
    pub play_sources: Vec<PlaySource>,
}

impl DbAble for Song {
    fn typ() -> Typ {
        Typ::Song
    }

    fn ref_id(&self) -> Option<String> {
        self.info_sources.first().map(|s| s.content().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub title: String,
    pub songs: Vec<DbId>,
}

impl DbAble for Playlist {
    fn typ() -> Typ {
        Typ::Playlist
    }
}

/// A list plus the position the listener is at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenQueue<T> {
    pub queue: T,
    pub current_index: Option<u32>,
}

/// Persisted play queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub queue: ListenQueue<Playlist>,
    /// Song the autoplay recommendations were derived from
    pub seed: Option<DbId>,
}

impl DbAble for Queue {
    fn typ() -> Typ {
        Typ::Queue
    }
}

/// Songs autoplay must not offer again
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongBlacklist {
    pub title: String,
    pub songs: Vec<InfoSource>,
}

impl DbAble for SongBlacklist {
    fn typ() -> Typ {
        Typ::SongBlacklist
    }
}

/// Artists autoplay must not offer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistBlacklist {
    pub title: String,
    pub artists: Vec<InfoSource>,
}

impl DbAble for ArtistBlacklist {
    fn typ() -> Typ {
        Typ::ArtistBlacklist
    }
}
