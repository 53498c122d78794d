//! Keyed list items
//!
//! Anything that can sit in a queue or a search result implements [`ListItem`].
//! Items are shared as trait objects and compared only through [`ListItem::key`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use super::entities::{DbItem, Song};
use super::ids::{Backend, DbId, InfoSource, PlaySource};
use crate::database::DbOps;
use crate::error::Result;

/// Shared handle to a list item
pub type SharedItem = Arc<dyn ListItem>;

/// Strategy used to derive recommendations from a seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutoplayKind {
    /// Backend-native "up next" / related browse for the item
    Related,
    /// Search for the item by title and artists, then browse related of the top hit
    SearchRelated,
    /// Artist radio
    Radio,
}

impl AutoplayKind {
    /// Order in which strategies are tried when seeding
    pub const ALL: [AutoplayKind; 3] = [
        AutoplayKind::Related,
        AutoplayKind::SearchRelated,
        AutoplayKind::Radio,
    ];
}

/// Query an item produces for one [`AutoplayKind`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum AutoplayQuery {
    Related { backend: Backend, id: String },
    SearchRelated { title: String, artists: Vec<String> },
    Radio { title: Option<String>, artists: Vec<String> },
}

/// An item that can be listed, queued and played
#[async_trait]
pub trait ListItem: Send + Sync + Debug {
    /// Opaque identity; two items with equal keys are the same item
    fn key(&self) -> String;

    fn title(&self) -> String;

    fn is_playable(&self) -> bool;

    /// Identity tokens of the song(s) this item stands for
    fn song_ids(&self) -> Vec<InfoSource>;

    /// Identity tokens of the artists credited on this item
    fn artist_ids(&self) -> Vec<InfoSource>;

    /// Resolve something a player can open
    async fn resolve_stream_uri(&self) -> Result<Option<PlaySource>>;

    async fn autoplay_query(&self, kind: AutoplayKind) -> Result<Option<AutoplayQuery>>;

    /// Persist or look up this item as a song in the given transaction
    async fn saved_song(&self, ops: &DbOps) -> Result<Option<DbItem<Song>>> {
        let _ = ops;
        Ok(None)
    }

    fn db_id(&self) -> Option<DbId> {
        None
    }
}
