use async_trait::async_trait;

use super::entities::{DbItem, Song};
use super::ids::{Backend, DbId, InfoSource, PlaySource};
use super::item::{AutoplayKind, AutoplayQuery, ListItem};
use crate::database::DbOps;
use crate::error::Result;

/// List item backed by a song stored in the covau database
#[derive(Debug, Clone, PartialEq)]
pub struct SongItem(pub DbItem<Song>);

impl SongItem {
    pub fn new(song: DbItem<Song>) -> Self {
        Self(song)
    }

    pub fn song(&self) -> &DbItem<Song> {
        &self.0
    }
}

#[async_trait]
impl ListItem for SongItem {
    fn key(&self) -> String {
        self.0.id.to_string()
    }

    fn title(&self) -> String {
        self.0.t.title.clone()
    }

    fn is_playable(&self) -> bool {
        !self.0.t.play_sources.is_empty()
    }

    fn song_ids(&self) -> Vec<InfoSource> {
        self.0.t.info_sources.clone()
    }

    // Local songs only carry artist names; they double as artist identity.
    fn artist_ids(&self) -> Vec<InfoSource> {
        self.0
            .t
            .artists
            .iter()
            .map(|name| InfoSource::MbzId(name.clone()))
            .collect()
    }

    async fn resolve_stream_uri(&self) -> Result<Option<PlaySource>> {
        Ok(self.0.t.play_sources.first().cloned())
    }

    async fn autoplay_query(&self, kind: AutoplayKind) -> Result<Option<AutoplayQuery>> {
        let song = &self.0.t;
        let query = match kind {
            AutoplayKind::Related => Some(AutoplayQuery::Related {
                backend: Backend::Local,
                id: self.0.id.to_string(),
            }),
            AutoplayKind::SearchRelated => Some(AutoplayQuery::SearchRelated {
                title: song.title.clone(),
                artists: song.artists.clone(),
            }),
            AutoplayKind::Radio if song.artists.is_empty() => None,
            AutoplayKind::Radio => Some(AutoplayQuery::Radio {
                title: Some(song.title.clone()),
                artists: song.artists.clone(),
            }),
        };
        Ok(query)
    }

    async fn saved_song(&self, _ops: &DbOps) -> Result<Option<DbItem<Song>>> {
        Ok(Some(self.0.clone()))
    }

    fn db_id(&self) -> Option<DbId> {
        Some(self.0.id)
    }
}
