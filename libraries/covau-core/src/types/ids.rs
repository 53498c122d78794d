/// ID types for Covau entities
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Database row identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbId(i64);

impl DbId {
    /// Create a new database ID
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw row id
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for DbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction identifier handed out by `Database::begin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(Uuid);

impl TxnId {
    /// Generate a new random transaction ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity token of a song or artist in some catalog
///
/// Two tokens refer to the same thing when their content matches, which is
/// what the autoplay blacklists compare on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum InfoSource {
    YtId(String),
    MbzId(String),
}

impl InfoSource {
    /// The raw identifier, without the catalog tag
    pub fn content(&self) -> &str {
        match self {
            InfoSource::YtId(id) | InfoSource::MbzId(id) => id,
        }
    }
}

/// Where playable media for a song can be found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum PlaySource {
    File(String),
    YtId(String),
}

impl PlaySource {
    /// Uri handed to a player
    pub fn uri(&self) -> String {
        match self {
            PlaySource::File(path) => format!("file://{path}"),
            PlaySource::YtId(id) => format!("yt://{id}"),
        }
    }
}

/// Backend a search query is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local covau database
    #[default]
    Local,
    /// Video streaming catalog
    SongTube,
    /// Metadata / recommendation service
    MusicBrainz,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::SongTube => write!(f, "songtube"),
            Backend::MusicBrainz => write!(f, "musicbrainz"),
        }
    }
}
