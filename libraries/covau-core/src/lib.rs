//! Covau Core
//!
//! Shared item, entity and collaborator definitions for Covau.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Items**: the [`ListItem`] trait every queue and search entry implements
//! - **Entities**: persisted documents (`Song`, `Queue`, blacklists) and their ids
//! - **Collaborators**: [`Player`], [`Database`], [`SearchSource`], [`SourceFactory`]
//! - **Error Handling**: unified [`CovauError`] and [`Result`] types
//!
//! # Example
//!
//! ```rust
//! use covau_core::types::{DbAble, Song, Typ};
//!
//! let song = Song {
//!     title: "Teardrop".to_string(),
//!     artists: vec!["Massive Attack".to_string()],
//!     ..Default::default()
//! };
//! assert_eq!(Song::typ(), Typ::Song);
//! assert_eq!(song.ref_id(), None);
//! ```

#![forbid(unsafe_code)]

pub mod database;
pub mod error;
pub mod player;
pub mod traits;
pub mod types;

pub use database::{txn, Database, DbOps};
pub use error::{CovauError, Result};
pub use player::{MessageHandler, Player, PlayerHandlers, PlayerMessage};
pub use traits::{DropHandler, SearchSource, SourceFactory, SourceQuery};

pub use types::{
    ArtistBlacklist, AutoplayKind, AutoplayQuery, Backend, DbAble, DbEntity, DbId, DbItem,
    DbMetadata, DbRow, InfoSource, InsertResponse, ListItem, ListenQueue, PlaySource, Playlist,
    Queue, SharedItem, Song, SongBlacklist, SongItem, TxnId, Typ,
};
