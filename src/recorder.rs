//! Listening session recording.
//!
//! One row per playback: opened when playback starts, closed when it stops,
//! pauses, ends or is replaced. The recorder does not enforce the
//! one-active-session-per-user rule; callers check [`SessionRecorder::get_active_session`]
//! and serialize their own start/end calls per user.

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::db::{Database, ListeningSession};
use crate::error::Result;
use crate::period::SessionStamp;
use crate::types::{Milliseconds, SessionId, SongId, UserId};

/// Opens and closes listening sessions.
#[derive(Clone)]
pub struct SessionRecorder {
    db: Database,
}

impl SessionRecorder {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open a session stamped with the current local time.
    pub async fn start_session(&self, user_id: UserId, song_id: SongId) -> Result<SessionId> {
        self.start_session_at(user_id, song_id, Local::now()).await
    }

    /// Open a session stamped with `at`.
    pub async fn start_session_at(
        &self,
        user_id: UserId,
        song_id: SongId,
        at: DateTime<Local>,
    ) -> Result<SessionId> {
        let stamp = SessionStamp::from_datetime(&at);
        let id = self.db.insert_session(user_id, song_id, &stamp).await?;
        info!(
            "Started session {id} for user {user_id}, song {song_id} on {}",
            stamp.date_string
        );
        Ok(id)
    }

    /// Close a session at the current time.
    ///
    /// An unknown session id is a no-op.
    pub async fn end_session(
        &self,
        session_id: SessionId,
        duration: Milliseconds,
        was_completed: bool,
    ) -> Result<()> {
        self.end_session_at(session_id, duration, was_completed, Local::now())
            .await
    }

    /// Close a session with an explicit end time.
    ///
    /// `duration` is the time actually listened and is stored as given,
    /// independent of `at - start_time` (playback may have been paused).
    pub async fn end_session_at(
        &self,
        session_id: SessionId,
        duration: Milliseconds,
        was_completed: bool,
        at: DateTime<Local>,
    ) -> Result<()> {
        let Some(session) = self.db.get_session(session_id).await? else {
            debug!("Session {session_id} not found, nothing to end");
            return Ok(());
        };

        self.db
            .close_session(session.id, at.timestamp_millis(), duration, was_completed)
            .await?;
        info!(
            "Ended session {session_id} after {duration} (completed: {was_completed})"
        );
        Ok(())
    }

    /// The user's open session, if any.
    pub async fn get_active_session(&self, user_id: UserId) -> Result<Option<ListeningSession>> {
        self.db.get_active_session(user_id).await
    }

    /// Fetch a session by id.
    pub async fn get_session(&self, session_id: SessionId) -> Result<Option<ListeningSession>> {
        self.db.get_session(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn recorder() -> SessionRecorder {
        SessionRecorder::new(Database::open_in_memory().await.unwrap())
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).earliest().unwrap()
    }

    #[tokio::test]
    async fn test_start_session_decomposes_local_calendar() {
        let recorder = recorder().await;
        let at = local(2024, 3, 9, 14, 30);
        let id = recorder
            .start_session_at(UserId::new(1), SongId::new(10), at)
            .await
            .unwrap();

        let session = recorder.get_session(id).await.unwrap().unwrap();
        assert_eq!(session.user_id, UserId::new(1));
        assert_eq!(session.song_id, SongId::new(10));
        assert_eq!(session.start_time, at.timestamp_millis());
        assert_eq!((session.year, session.month, session.day_of_month), (2024, 3, 9));
        assert_eq!(session.date_string, "2024-03-09");
        assert!(session.is_active());
        assert!(session.actual_listen_duration.is_zero());
        assert!(!session.was_completed);
    }

    #[tokio::test]
    async fn test_end_session_records_duration_independently_of_wall_clock() {
        let recorder = recorder().await;
        let start = local(2024, 3, 9, 14, 30);
        let id = recorder
            .start_session_at(UserId::new(1), SongId::new(10), start)
            .await
            .unwrap();

        // Ten minutes on the wall clock, 65 seconds actually listened
        let end = local(2024, 3, 9, 14, 40);
        recorder
            .end_session_at(id, Milliseconds::new(65_000), true, end)
            .await
            .unwrap();

        let session = recorder.get_session(id).await.unwrap().unwrap();
        assert_eq!(session.end_time, Some(end.timestamp_millis()));
        assert_eq!(session.actual_listen_duration, Milliseconds::new(65_000));
        assert!(session.was_completed);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_end_unknown_session_is_silent_noop() {
        let recorder = recorder().await;
        recorder
            .end_session(SessionId::new(404), Milliseconds::new(1000), true)
            .await
            .unwrap();
        assert_eq!(recorder.db.get_session_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_active_session_tracks_open_row() {
        let recorder = recorder().await;
        let user = UserId::new(7);
        assert!(recorder.get_active_session(user).await.unwrap().is_none());

        let first = recorder
            .start_session_at(user, SongId::new(1), local(2024, 5, 1, 9, 0))
            .await
            .unwrap();
        let active = recorder.get_active_session(user).await.unwrap().unwrap();
        assert_eq!(active.id, first);

        // Other users do not see it
        assert!(recorder
            .get_active_session(UserId::new(8))
            .await
            .unwrap()
            .is_none());

        recorder
            .end_session(first, Milliseconds::from_secs(30), false)
            .await
            .unwrap();
        assert!(recorder.get_active_session(user).await.unwrap().is_none());

        let second = recorder.start_session(user, SongId::new(2)).await.unwrap();
        assert_ne!(first, second);
        let active = recorder.get_active_session(user).await.unwrap().unwrap();
        assert_eq!(active.song_id, SongId::new(2));
    }
}
