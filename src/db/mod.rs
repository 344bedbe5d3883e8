//! Database module using DuckDB
//!
//! Single storage handle for listening sessions and the song catalog mirror.
//! The handle is cheap to clone and is passed explicitly to every component
//! that needs storage; there is no process-wide instance.

mod filter;
mod queries;
mod schema;

pub use filter::SessionFilter;

use chrono::{NaiveDate, Weekday};
use duckdb::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::catalog::Song;
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::period::{MonthYear, SessionStamp};
use crate::types::{Milliseconds, PlayCount, SessionId, SongId, UserId};

/// Database wrapper for listening analytics using DuckDB
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Create a new database connection
    ///
    /// # Arguments
    /// * `config` - Database configuration
    /// * `data_dir` - Default data directory for local DB
    pub async fn new(config: &DatabaseConfig, data_dir: &Path) -> Result<Self> {
        let db_path = if let Some(ref path) = config.path {
            let path = Path::new(path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path.to_path_buf()
        } else {
            std::fs::create_dir_all(data_dir)?;
            data_dir.join("analytics.duckdb")
        };

        // Open DuckDB connection (synchronous, so we use spawn_blocking)
        let conn = tokio::task::spawn_blocking(move || Connection::open(&db_path)).await??;
        Self::from_connection(conn).await
    }

    /// Open a throwaway in-memory database
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn).await
    }

    async fn from_connection(conn: Connection) -> Result<Self> {
        let instance = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        instance.init().await?;
        Ok(instance)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        schema::init_schema(&conn)
    }

    /// Run raw SQL against the connection.
    #[cfg(test)]
    pub(crate) async fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Insert a new open session and return its id
    pub async fn insert_session(
        &self,
        user_id: UserId,
        song_id: SongId,
        stamp: &SessionStamp,
    ) -> Result<SessionId> {
        let conn = self.conn.lock().await;
        queries::insert_session(&conn, user_id, song_id, stamp)
    }

    /// Fetch a session by id
    pub async fn get_session(&self, id: SessionId) -> Result<Option<ListeningSession>> {
        let conn = self.conn.lock().await;
        queries::get_session(&conn, id)
    }

    /// Fetch the most recent open session of a user
    pub async fn get_active_session(&self, user_id: UserId) -> Result<Option<ListeningSession>> {
        let conn = self.conn.lock().await;
        queries::get_active_session(&conn, user_id)
    }

    /// Finalize a session. Returns whether a row was updated.
    pub async fn close_session(
        &self,
        id: SessionId,
        end_time_ms: i64,
        duration: Milliseconds,
        was_completed: bool,
    ) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::close_session(&conn, id, end_time_ms, duration, was_completed)
    }

    /// Total number of recorded sessions
    pub async fn get_session_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::get_session_count(&conn)
    }

    // ------------------------------------------------------------------
    // Aggregations
    // ------------------------------------------------------------------

    /// Sum of listen durations in a month
    pub async fn get_total_listen_time(
        &self,
        user_id: UserId,
        month: MonthYear,
    ) -> Result<Milliseconds> {
        let conn = self.conn.lock().await;
        queries::get_total_listen_time(&conn, &SessionFilter::month(user_id, month))
    }

    /// Sum of listen durations on one local calendar day
    pub async fn get_total_listen_time_for_day(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Milliseconds> {
        let conn = self.conn.lock().await;
        queries::get_total_listen_time(&conn, &SessionFilter::day(user_id, date))
    }

    /// Mean of per-day sums over the days that have sessions
    pub async fn get_daily_average(
        &self,
        user_id: UserId,
        month: MonthYear,
    ) -> Result<Option<Milliseconds>> {
        let conn = self.conn.lock().await;
        queries::get_daily_average(&conn, &SessionFilter::month(user_id, month))
    }

    /// Distinct artists and distinct songs listened to in a month
    pub async fn get_unique_counts(
        &self,
        user_id: UserId,
        month: MonthYear,
    ) -> Result<UniqueCounts> {
        let conn = self.conn.lock().await;
        queries::get_unique_counts(&conn, &SessionFilter::month(user_id, month))
    }

    /// Get top artists by play count, then listen time
    pub async fn get_top_artists(
        &self,
        user_id: UserId,
        month: MonthYear,
        limit: u32,
    ) -> Result<Vec<ArtistStats>> {
        let conn = self.conn.lock().await;
        queries::get_top_artists(&conn, &SessionFilter::month(user_id, month), limit)
    }

    /// Get top songs by play count, then listen time
    pub async fn get_top_songs(
        &self,
        user_id: UserId,
        month: MonthYear,
        limit: u32,
    ) -> Result<Vec<SongStats>> {
        let conn = self.conn.lock().await;
        queries::get_top_songs(&conn, &SessionFilter::month(user_id, month), limit)
    }

    /// Weekday with the most sessions in a month
    pub async fn get_most_active_day(
        &self,
        user_id: UserId,
        month: MonthYear,
    ) -> Result<Option<DayOfWeekStats>> {
        let conn = self.conn.lock().await;
        queries::get_most_active_day(&conn, &SessionFilter::month(user_id, month))
    }

    /// Months with at least one session, most recent first
    pub async fn get_months_with_sessions(&self, user_id: UserId) -> Result<Vec<MonthYear>> {
        let conn = self.conn.lock().await;
        queries::get_months_with_sessions(&conn, &SessionFilter::user(user_id))
    }

    /// Per-date listen totals for the days of a month that have sessions
    pub async fn get_daily_totals(
        &self,
        user_id: UserId,
        month: MonthYear,
    ) -> Result<Vec<(String, Milliseconds)>> {
        let conn = self.conn.lock().await;
        queries::get_daily_totals(&conn, &SessionFilter::month(user_id, month))
    }

    /// Distinct (song, date) pairs across the user's whole history
    pub async fn get_song_play_dates(&self, user_id: UserId) -> Result<Vec<(SongId, String)>> {
        let conn = self.conn.lock().await;
        queries::get_song_play_dates(&conn, &SessionFilter::user(user_id))
    }

    // ------------------------------------------------------------------
    // Song catalog mirror
    // ------------------------------------------------------------------

    /// Insert or replace a song's metadata
    pub async fn upsert_song(&self, song: &Song) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::upsert_song(&conn, song)
    }

    /// Remove a song from the catalog mirror
    pub async fn delete_song(&self, id: SongId) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::delete_song(&conn, id)
    }

    /// Batched lookup of songs by id. Unknown ids are skipped.
    pub async fn get_songs_by_ids(&self, ids: &[SongId]) -> Result<Vec<Song>> {
        let conn = self.conn.lock().await;
        queries::get_songs_by_ids(&conn, ids)
    }
}

/// One listening session row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListeningSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub song_id: SongId,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds; `None` while the session is active.
    pub end_time: Option<i64>,
    pub actual_listen_duration: Milliseconds,
    pub was_completed: bool,
    pub year: i32,
    pub month: u32,
    pub day_of_month: u32,
    pub date_string: String,
}

impl ListeningSession {
    /// Whether the session is still open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Aggregated statistics for an artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistStats {
    /// Artist name.
    pub artist: String,
    /// Number of sessions.
    pub play_count: PlayCount,
    /// Total listening time.
    pub total: Milliseconds,
}

/// Aggregated statistics for a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongStats {
    pub song_id: SongId,
    pub title: String,
    pub artist: String,
    /// Artwork reference from the catalog, if any.
    pub artwork: Option<String>,
    pub play_count: PlayCount,
    pub total: Milliseconds,
}

/// Activity on one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayOfWeekStats {
    pub weekday: Weekday,
    pub session_count: PlayCount,
    pub total: Milliseconds,
}

/// Distinct artists and songs in a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UniqueCounts {
    pub artists: i64,
    pub songs: i64,
}
