mod entities;
mod ids;
mod item;
mod song_item;

pub use entities::{
    ArtistBlacklist, DbAble, DbEntity, DbItem, DbMetadata, DbRow, InsertResponse, ListenQueue,
    Playlist, Queue, Song, SongBlacklist, Typ,
};
pub use ids::{Backend, DbId, InfoSource, PlaySource, TxnId};
pub use item::{AutoplayKind, AutoplayQuery, ListItem, SharedItem};
pub use song_item::SongItem;
