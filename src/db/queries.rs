//! Database query implementations for DuckDB

use chrono::Weekday;
use duckdb::{params, params_from_iter, Connection, Row};

use crate::catalog::Song;
use crate::error::Result;
use crate::period::{MonthYear, SessionStamp};
use crate::types::{Milliseconds, PlayCount, SessionId, SongId, UserId};

use super::filter::SessionFilter;
use super::{ArtistStats, DayOfWeekStats, ListeningSession, SongStats, UniqueCounts};

const SESSION_COLUMNS: &str = r"
    id, user_id, song_id, start_time, end_time, actual_listen_duration_ms,
    was_completed, year, month, day_of_month, date_string
";

fn session_from_row(row: &Row<'_>) -> duckdb::Result<ListeningSession> {
    Ok(ListeningSession {
        id: SessionId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        song_id: SongId::new(row.get(2)?),
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        actual_listen_duration: Milliseconds::new(row.get(5)?),
        was_completed: row.get(6)?,
        year: row.get(7)?,
        month: row.get(8)?,
        day_of_month: row.get(9)?,
        date_string: row.get(10)?,
    })
}

/// Insert an open session row
pub fn insert_session(
    conn: &Connection,
    user_id: UserId,
    song_id: SongId,
    stamp: &SessionStamp,
) -> Result<SessionId> {
    // Callers hold the connection lock, so drawing the id first cannot race
    let id: i64 = conn.query_row("SELECT nextval('listening_sessions_id_seq')", [], |row| {
        row.get(0)
    })?;

    conn.execute(
        r"
        INSERT INTO listening_sessions (
            id, user_id, song_id, start_time,
            year, month, day_of_month, day_of_week, date_string
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ",
        params![
            id,
            user_id.get(),
            song_id.get(),
            stamp.epoch_ms,
            stamp.year,
            stamp.month,
            stamp.day_of_month,
            stamp.day_of_week,
            stamp.date_string.as_str(),
        ],
    )?;

    Ok(SessionId::new(id))
}

/// Fetch one session by id
pub fn get_session(conn: &Connection, id: SessionId) -> Result<Option<ListeningSession>> {
    let query = format!("SELECT {SESSION_COLUMNS} FROM listening_sessions WHERE id = ?");
    let mut stmt = conn.prepare(&query)?;
    let mut rows = stmt.query_map(params![id.get()], session_from_row)?;
    Ok(rows.next().transpose()?)
}

/// Fetch the most recent open session of a user
pub fn get_active_session(conn: &Connection, user_id: UserId) -> Result<Option<ListeningSession>> {
    let query = format!(
        "SELECT {SESSION_COLUMNS} FROM listening_sessions \
         WHERE user_id = ? AND end_time IS NULL \
         ORDER BY start_time DESC, id DESC LIMIT 1"
    );
    let mut stmt = conn.prepare(&query)?;
    let mut rows = stmt.query_map(params![user_id.get()], session_from_row)?;
    Ok(rows.next().transpose()?)
}

/// Set end time, duration and completion flag of a session
pub fn close_session(
    conn: &Connection,
    id: SessionId,
    end_time_ms: i64,
    duration: Milliseconds,
    was_completed: bool,
) -> Result<bool> {
    let updated = conn.execute(
        r"
        UPDATE listening_sessions
        SET end_time = ?1, actual_listen_duration_ms = ?2, was_completed = ?3
        WHERE id = ?4
        ",
        params![end_time_ms, duration.get(), was_completed, id.get()],
    )?;
    Ok(updated > 0)
}

/// Get total session count
pub fn get_session_count(conn: &Connection) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM listening_sessions")?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(count)
}

/// Sum of listen durations matching the filter
pub fn get_total_listen_time(conn: &Connection, filter: &SessionFilter) -> Result<Milliseconds> {
    let (where_clause, params) = filter.where_clause(None);
    // SUM over BIGINT is HUGEINT in DuckDB
    let query = format!(
        "SELECT CAST(COALESCE(SUM(actual_listen_duration_ms), 0) AS BIGINT) \
         FROM listening_sessions{where_clause}"
    );

    let mut stmt = conn.prepare(&query)?;
    let total: i64 = stmt.query_row(params_from_iter(params), |row| row.get(0))?;
    Ok(Milliseconds::new(total))
}

/// Mean of per-date sums. Dates without sessions are absent from the
/// grouping rather than counted as zero.
pub fn get_daily_average(
    conn: &Connection,
    filter: &SessionFilter,
) -> Result<Option<Milliseconds>> {
    let (where_clause, params) = filter.where_clause(None);
    let query = format!(
        r"
        SELECT AVG(day_total) FROM (
            SELECT date_string, SUM(actual_listen_duration_ms) AS day_total
            FROM listening_sessions{where_clause}
            GROUP BY date_string
        )
        "
    );

    let mut stmt = conn.prepare(&query)?;
    let average: Option<f64> = stmt.query_row(params_from_iter(params), |row| row.get(0))?;
    Ok(average.map(|avg| Milliseconds::new(avg.round() as i64)))
}

/// Distinct artists and songs among sessions whose song is in the catalog
pub fn get_unique_counts(conn: &Connection, filter: &SessionFilter) -> Result<UniqueCounts> {
    let (where_clause, params) = filter.where_clause(Some("s"));
    let query = format!(
        r"
        SELECT
            COUNT(DISTINCT so.artist) AS unique_artists,
            COUNT(DISTINCT s.song_id) AS unique_songs
        FROM listening_sessions s
        JOIN songs so ON so.id = s.song_id{where_clause}
        "
    );

    let mut stmt = conn.prepare(&query)?;
    let counts = stmt.query_row(params_from_iter(params), |row| {
        Ok(UniqueCounts {
            artists: row.get(0)?,
            songs: row.get(1)?,
        })
    })?;
    Ok(counts)
}

/// Get top artists ranked by play count, then listen time
pub fn get_top_artists(
    conn: &Connection,
    filter: &SessionFilter,
    limit: u32,
) -> Result<Vec<ArtistStats>> {
    let (where_clause, params) = filter.where_clause(Some("s"));
    let query = format!(
        r"
        SELECT
            so.artist,
            COUNT(*) AS play_count,
            CAST(COALESCE(SUM(s.actual_listen_duration_ms), 0) AS BIGINT) AS total_ms
        FROM listening_sessions s
        JOIN songs so ON so.id = s.song_id{where_clause}
        GROUP BY so.artist
        ORDER BY play_count DESC, total_ms DESC, so.artist ASC
        LIMIT {limit}
        "
    );

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(params_from_iter(params), |row| {
        Ok(ArtistStats {
            artist: row.get(0)?,
            play_count: PlayCount::new(row.get(1)?),
            total: Milliseconds::new(row.get(2)?),
        })
    })?;

    let mut stats = Vec::new();
    for row in rows {
        stats.push(row?);
    }

    Ok(stats)
}

/// Get top songs ranked by play count, then listen time
pub fn get_top_songs(
    conn: &Connection,
    filter: &SessionFilter,
    limit: u32,
) -> Result<Vec<SongStats>> {
    let (where_clause, params) = filter.where_clause(Some("s"));
    let query = format!(
        r"
        SELECT
            s.song_id,
            so.title,
            so.artist,
            so.artwork,
            COUNT(*) AS play_count,
            CAST(COALESCE(SUM(s.actual_listen_duration_ms), 0) AS BIGINT) AS total_ms
        FROM listening_sessions s
        JOIN songs so ON so.id = s.song_id{where_clause}
        GROUP BY s.song_id, so.title, so.artist, so.artwork
        ORDER BY play_count DESC, total_ms DESC, s.song_id ASC
        LIMIT {limit}
        "
    );

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(params_from_iter(params), |row| {
        Ok(SongStats {
            song_id: SongId::new(row.get(0)?),
            title: row.get(1)?,
            artist: row.get(2)?,
            artwork: row.get(3)?,
            play_count: PlayCount::new(row.get(4)?),
            total: Milliseconds::new(row.get(5)?),
        })
    })?;

    let mut stats = Vec::new();
    for row in rows {
        stats.push(row?);
    }

    Ok(stats)
}

/// Weekday with the most sessions, ties broken by listen time
pub fn get_most_active_day(
    conn: &Connection,
    filter: &SessionFilter,
) -> Result<Option<DayOfWeekStats>> {
    let (where_clause, params) = filter.where_clause(None);
    let query = format!(
        r"
        SELECT
            day_of_week,
            COUNT(*) AS session_count,
            CAST(COALESCE(SUM(actual_listen_duration_ms), 0) AS BIGINT) AS total_ms
        FROM listening_sessions{where_clause}
        GROUP BY day_of_week
        ORDER BY session_count DESC, total_ms DESC, day_of_week ASC
        LIMIT 1
        "
    );

    let mut stmt = conn.prepare(&query)?;
    let mut rows = stmt.query_map(params_from_iter(params), |row| {
        let day: u8 = row.get(0)?;
        let count: i64 = row.get(1)?;
        let total: i64 = row.get(2)?;
        Ok((day, count, total))
    })?;

    let Some((day, count, total)) = rows.next().transpose()? else {
        return Ok(None);
    };

    Ok(Weekday::try_from(day).ok().map(|weekday| DayOfWeekStats {
        weekday,
        session_count: PlayCount::new(count),
        total: Milliseconds::new(total),
    }))
}

/// (year, month) pairs with at least one session, most recent first
pub fn get_months_with_sessions(conn: &Connection, filter: &SessionFilter) -> Result<Vec<MonthYear>> {
    let (where_clause, params) = filter.where_clause(None);
    let query = format!(
        r"
        SELECT DISTINCT year, month
        FROM listening_sessions{where_clause}
        ORDER BY year DESC, month DESC
        "
    );

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(params_from_iter(params), |row| {
        Ok(MonthYear {
            year: row.get(0)?,
            month: row.get(1)?,
        })
    })?;

    let mut months = Vec::new();
    for row in rows {
        months.push(row?);
    }

    Ok(months)
}

/// Listen totals per date, chronological
pub fn get_daily_totals(
    conn: &Connection,
    filter: &SessionFilter,
) -> Result<Vec<(String, Milliseconds)>> {
    let (where_clause, params) = filter.where_clause(None);
    let query = format!(
        r"
        SELECT
            date_string,
            CAST(COALESCE(SUM(actual_listen_duration_ms), 0) AS BIGINT) AS total_ms
        FROM listening_sessions{where_clause}
        GROUP BY date_string
        ORDER BY date_string ASC
        "
    );

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(params_from_iter(params), |row| {
        Ok((row.get::<_, String>(0)?, Milliseconds::new(row.get(1)?)))
    })?;

    let mut totals = Vec::new();
    for row in rows {
        totals.push(row?);
    }

    Ok(totals)
}

/// Every distinct (song, date) a user has listened on
pub fn get_song_play_dates(
    conn: &Connection,
    filter: &SessionFilter,
) -> Result<Vec<(SongId, String)>> {
    let (where_clause, params) = filter.where_clause(None);
    let query = format!(
        r"
        SELECT DISTINCT song_id, date_string
        FROM listening_sessions{where_clause}
        ORDER BY song_id, date_string
        "
    );

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(params_from_iter(params), |row| {
        Ok((SongId::new(row.get(0)?), row.get::<_, String>(1)?))
    })?;

    let mut pairs = Vec::new();
    for row in rows {
        pairs.push(row?);
    }

    Ok(pairs)
}

/// Insert or replace a song in the catalog mirror
pub fn upsert_song(conn: &Connection, song: &Song) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO songs (id, title, artist, artwork) VALUES (?1, ?2, ?3, ?4)",
        params![
            song.id.get(),
            song.title.as_str(),
            song.artist.as_str(),
            song.artwork.as_deref(),
        ],
    )?;
    Ok(())
}

/// Delete a song from the catalog mirror
pub fn delete_song(conn: &Connection, id: SongId) -> Result<()> {
    conn.execute("DELETE FROM songs WHERE id = ?", params![id.get()])?;
    Ok(())
}

/// Look up many songs in one statement
pub fn get_songs_by_ids(conn: &Connection, ids: &[SongId]) -> Result<Vec<Song>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let query = format!(
        "SELECT id, title, artist, artwork FROM songs WHERE id IN ({placeholders}) ORDER BY id"
    );

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(params_from_iter(ids.iter().map(|id| id.get())), |row| {
        Ok(Song {
            id: SongId::new(row.get(0)?),
            title: row.get(1)?,
            artist: row.get(2)?,
            artwork: row.get(3)?,
        })
    })?;

    let mut songs = Vec::new();
    for row in rows {
        songs.push(row?);
    }

    Ok(songs)
}
