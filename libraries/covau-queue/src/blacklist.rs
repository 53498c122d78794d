//! Song and artist blacklists for autoplay
//!
//! Tokens are compared on their content only, so the same id reached through
//! different catalogs is treated as one.

use covau_core::{InfoSource, SharedItem};
use std::collections::HashSet;

/// Ordered token list mirrored by a set for O(1) membership
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    list: Vec<InfoSource>,
    set: HashSet<String>,
    dirty: bool,
}

impl TokenSet {
    pub fn from_list(tokens: Vec<InfoSource>) -> Self {
        let mut this = Self::default();
        for token in tokens {
            this.insert(token);
        }
        this.dirty = false;
        this
    }

    pub fn contains(&self, token: &InfoSource) -> bool {
        self.set.contains(token.content())
    }

    /// Returns whether the token was new
    pub fn insert(&mut self, token: InfoSource) -> bool {
        if !self.set.insert(token.content().to_string()) {
            return false;
        }
        self.list.push(token);
        self.dirty = true;
        true
    }

    /// Returns whether the token was present
    pub fn remove(&mut self, token: &InfoSource) -> bool {
        if !self.set.remove(token.content()) {
            return false;
        }
        self.list.retain(|t| t.content() != token.content());
        self.dirty = true;
        true
    }

    pub fn list(&self) -> &[InfoSource] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Which halves changed since the last [`Blacklist::take_changes`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlacklistChanges {
    pub songs: bool,
    pub artists: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    songs: TokenSet,
    artists: TokenSet,
}

impl Blacklist {
    pub fn new(songs: Vec<InfoSource>, artists: Vec<InfoSource>) -> Self {
        Self {
            songs: TokenSet::from_list(songs),
            artists: TokenSet::from_list(artists),
        }
    }

    pub fn songs(&self) -> &TokenSet {
        &self.songs
    }

    pub fn artists(&self) -> &TokenSet {
        &self.artists
    }

    /// Blacklist every song id of `item`
    pub fn add_songs(&mut self, item: &SharedItem) {
        for id in item.song_ids() {
            self.songs.insert(id);
        }
    }

    pub fn add_artists(&mut self, item: &SharedItem) {
        for id in item.artist_ids() {
            self.artists.insert(id);
        }
    }

    pub fn remove_artists(&mut self, item: &SharedItem) {
        for id in item.artist_ids() {
            self.artists.remove(&id);
        }
    }

    /// Whether any song or artist id of `item` is blacklisted
    pub fn blocks(&self, item: &SharedItem) -> bool {
        item.song_ids().iter().any(|id| self.songs.contains(id))
            || item.artist_ids().iter().any(|id| self.artists.contains(id))
    }

    pub fn replace_songs(&mut self, songs: Vec<InfoSource>) {
        self.songs = TokenSet::from_list(songs);
    }

    pub fn replace_artists(&mut self, artists: Vec<InfoSource>) {
        self.artists = TokenSet::from_list(artists);
    }

    pub fn take_changes(&mut self) -> BlacklistChanges {
        BlacklistChanges {
            songs: self.songs.take_dirty(),
            artists: self.artists.take_dirty(),
        }
    }
}
