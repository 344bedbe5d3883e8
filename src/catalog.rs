//! Song metadata lookup.
//!
//! The song library is owned elsewhere; analytics only needs to resolve ids
//! to titles, artists and artwork, a batch at a time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::Result;
use crate::types::SongId;

/// Song metadata as supplied by the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub artwork: Option<String>,
}

impl Song {
    /// Create a song without artwork.
    pub fn new(id: SongId, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            artwork: None,
        }
    }
}

/// Batched metadata lookup by song id.
///
/// Implementations return only the songs they know; ids with no match are
/// left out of the result rather than reported as errors.
#[async_trait]
pub trait SongCatalog: Send + Sync {
    async fn songs_by_ids(&self, ids: &[SongId]) -> Result<Vec<Song>>;
}

#[async_trait]
impl SongCatalog for Database {
    async fn songs_by_ids(&self, ids: &[SongId]) -> Result<Vec<Song>> {
        self.get_songs_by_ids(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_catalog_skips_unknown_ids() {
        let db = Database::open_in_memory().await.unwrap();
        db.upsert_song(&Song::new(SongId::new(1), "Heroes", "David Bowie"))
            .await
            .unwrap();
        db.upsert_song(&Song::new(SongId::new(2), "Low", "David Bowie")).await.unwrap();

        let songs = db
            .songs_by_ids(&[SongId::new(2), SongId::new(99), SongId::new(1)])
            .await
            .unwrap();
        let ids: Vec<_> = songs.iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);

        assert!(db.songs_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_metadata() {
        let db = Database::open_in_memory().await.unwrap();
        db.upsert_song(&Song::new(SongId::new(5), "Untitled", "Unknown")).await.unwrap();

        let mut song = Song::new(SongId::new(5), "Ashes to Ashes", "David Bowie");
        song.artwork = Some("covers/scary-monsters.jpg".to_string());
        db.upsert_song(&song).await.unwrap();

        let found = db.songs_by_ids(&[SongId::new(5)]).await.unwrap();
        assert_eq!(found, vec![song]);
    }
}
