//! Analytics facade
//!
//! Composes the aggregation queries, the streak calculator and the song
//! catalog into monthly reports. Reports are cached per (user, month); the
//! current month's entry, and the start month of a closed session, are
//! dropped whenever a session is written through this facade.

mod live;
pub mod streaks;

pub use live::CurrentMonthWatch;
pub use streaks::{top_day_streaks, SongStreak};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::catalog::SongCatalog;
use crate::config::AnalyticsConfig;
use crate::db::{ArtistStats, Database, DayOfWeekStats, SongStats};
use crate::error::Result;
use crate::period::{format_date, MonthYear};
use crate::recorder::SessionRecorder;
use crate::types::{Milliseconds, SessionId, SongId, UserId};

/// Default length of the top artists / top songs lists.
pub const DEFAULT_TOP_N: u32 = 5;

/// Default polling interval of the current-month view.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Tunables for report sizes and live refresh.
#[derive(Debug, Clone)]
pub struct AnalyticsSettings {
    pub top_n: u32,
    pub streak_limit: usize,
    pub refresh_interval: Duration,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            streak_limit: streaks::DEFAULT_STREAK_LIMIT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl AnalyticsSettings {
    /// Build settings from the `[analytics]` config section.
    pub fn from_config(config: &AnalyticsConfig) -> Result<Self> {
        Ok(Self {
            top_n: config.top_n,
            streak_limit: config.streak_limit as usize,
            refresh_interval: config.refresh_interval()?,
        })
    }
}

/// A song's longest day streak joined with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStreakSong {
    pub song_id: SongId,
    pub title: String,
    pub artist: String,
    pub artwork: Option<String>,
    pub consecutive_days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One month's report.
///
/// `day_streak_songs` is computed over the user's whole history, so every
/// month of the same user carries the same list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyAnalytics {
    pub year: i32,
    pub month: u32,
    pub total_listen_time: Milliseconds,
    pub top_artists: Vec<ArtistStats>,
    pub top_songs: Vec<SongStats>,
    pub day_streak_songs: Vec<DayStreakSong>,
}

impl MonthlyAnalytics {
    /// The reporting period.
    #[must_use]
    pub const fn period(&self) -> MonthYear {
        MonthYear {
            year: self.year,
            month: self.month,
        }
    }
}

/// Secondary figures for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub period: MonthYear,
    pub total_listen_time: Milliseconds,
    /// Days with at least one session, including zero-length ones.
    pub days_listened: u32,
    /// Mean over days with at least one session; `None` for an empty month.
    pub daily_average: Option<Milliseconds>,
    pub unique_artists: i64,
    pub unique_songs: i64,
    pub most_active_day: Option<DayOfWeekStats>,
}

/// Listen time on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyListen {
    pub day_of_month: u32,
    pub date: NaiveDate,
    pub total: Milliseconds,
}

type ReportCache = HashMap<(UserId, MonthYear), MonthlyAnalytics>;

/// Entry point for recording sessions and reading reports.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Database,
    catalog: Arc<dyn SongCatalog>,
    recorder: SessionRecorder,
    settings: AnalyticsSettings,
    cache: Arc<RwLock<ReportCache>>,
}

impl AnalyticsService {
    /// Use `db` both for sessions and as the song catalog.
    #[must_use]
    pub fn new(db: Database, settings: AnalyticsSettings) -> Self {
        let catalog: Arc<dyn SongCatalog> = Arc::new(db.clone());
        Self::with_catalog(db, catalog, settings)
    }

    /// Resolve song metadata through a separate catalog.
    #[must_use]
    pub fn with_catalog(
        db: Database,
        catalog: Arc<dyn SongCatalog>,
        settings: AnalyticsSettings,
    ) -> Self {
        Self {
            recorder: SessionRecorder::new(db.clone()),
            db,
            catalog,
            settings,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The underlying session recorder.
    #[must_use]
    pub const fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    #[must_use]
    pub const fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    /// Open a session and invalidate the current month's report.
    pub async fn start_session(&self, user_id: UserId, song_id: SongId) -> Result<SessionId> {
        let id = self.recorder.start_session(user_id, song_id).await?;
        self.invalidate_current_month(user_id).await;
        Ok(id)
    }

    /// Close a session and invalidate the reports it touches.
    ///
    /// Sessions are bucketed by start date, so one opened before midnight on
    /// the last day of a month lands in that month even when closed in the
    /// next one.
    pub async fn end_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
        duration: Milliseconds,
        was_completed: bool,
    ) -> Result<()> {
        let started_in = self
            .recorder
            .get_session(session_id)
            .await?
            .map(|session| MonthYear {
                year: session.year,
                month: session.month,
            });

        self.recorder
            .end_session(session_id, duration, was_completed)
            .await?;

        if let Some(month) = started_in {
            self.invalidate(user_id, month).await;
        }
        self.invalidate_current_month(user_id).await;
        Ok(())
    }

    /// Total, top artists, top songs and day streaks for one month.
    pub async fn monthly_analytics(
        &self,
        user_id: UserId,
        month: MonthYear,
    ) -> Result<MonthlyAnalytics> {
        if let Some(cached) = self.cache.read().await.get(&(user_id, month)) {
            debug!("Serving cached report for user {user_id}, {month}");
            return Ok(cached.clone());
        }

        let report = self
            .compute_monthly_analytics(user_id, month)
            .await
            .inspect_err(|e| error!("Failed to build report for user {user_id}, {month}: {e}"))?;

        self.cache
            .write()
            .await
            .insert((user_id, month), report.clone());
        Ok(report)
    }

    async fn compute_monthly_analytics(
        &self,
        user_id: UserId,
        month: MonthYear,
    ) -> Result<MonthlyAnalytics> {
        let top_n = self.settings.top_n;
        let total_listen_time = self.db.get_total_listen_time(user_id, month).await?;
        let top_artists = self.db.get_top_artists(user_id, month, top_n).await?;
        let top_songs = self.db.get_top_songs(user_id, month, top_n).await?;
        let day_streak_songs = self.day_streak_songs(user_id).await?;

        Ok(MonthlyAnalytics {
            year: month.year,
            month: month.month,
            total_listen_time,
            top_artists,
            top_songs,
            day_streak_songs,
        })
    }

    /// Reports for several months, in the order given.
    pub async fn analytics_for_months(
        &self,
        user_id: UserId,
        months: &[MonthYear],
    ) -> Result<Vec<MonthlyAnalytics>> {
        let mut reports = Vec::with_capacity(months.len());
        for &month in months {
            reports.push(self.monthly_analytics(user_id, month).await?);
        }
        Ok(reports)
    }

    /// Reports for every month with sessions, most recent first.
    pub async fn analytics_history(&self, user_id: UserId) -> Result<Vec<MonthlyAnalytics>> {
        let months = self.db.get_months_with_sessions(user_id).await?;
        self.analytics_for_months(user_id, &months).await
    }

    /// Months that have at least one session, most recent first.
    pub async fn available_months(&self, user_id: UserId) -> Result<Vec<MonthYear>> {
        self.db.get_months_with_sessions(user_id).await
    }

    /// The user's longest per-song day streaks across all history.
    ///
    /// Songs missing from the catalog are dropped.
    pub async fn day_streak_songs(&self, user_id: UserId) -> Result<Vec<DayStreakSong>> {
        let plays = self.db.get_song_play_dates(user_id).await?;
        let streaks = top_day_streaks(plays, self.settings.streak_limit);
        if streaks.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<SongId> = streaks.iter().map(|s| s.song_id).collect();
        let songs: HashMap<SongId, _> = self
            .catalog
            .songs_by_ids(&ids)
            .await?
            .into_iter()
            .map(|song| (song.id, song))
            .collect();

        Ok(streaks
            .into_iter()
            .filter_map(|streak| {
                let Some(song) = songs.get(&streak.song_id) else {
                    debug!("No metadata for streak song {}, dropping", streak.song_id);
                    return None;
                };
                Some(DayStreakSong {
                    song_id: streak.song_id,
                    title: song.title.clone(),
                    artist: song.artist.clone(),
                    artwork: song.artwork.clone(),
                    consecutive_days: streak.consecutive_days,
                    start_date: streak.start_date,
                    end_date: streak.end_date,
                })
            })
            .collect())
    }

    /// Daily average, distinct counts and busiest weekday for a month.
    pub async fn monthly_summary(&self, user_id: UserId, month: MonthYear) -> Result<MonthlySummary> {
        let total_listen_time = self.db.get_total_listen_time(user_id, month).await?;
        let daily_average = self.db.get_daily_average(user_id, month).await?;
        let days_listened = self.db.get_daily_totals(user_id, month).await?.len();
        let counts = self.db.get_unique_counts(user_id, month).await?;
        let most_active_day = self.db.get_most_active_day(user_id, month).await?;

        Ok(MonthlySummary {
            period: month,
            total_listen_time,
            days_listened: u32::try_from(days_listened).unwrap_or(u32::MAX),
            daily_average,
            unique_artists: counts.artists,
            unique_songs: counts.songs,
            most_active_day,
        })
    }

    /// Listen time for every day of the month, zero on days without sessions.
    pub async fn daily_listen_data(
        &self,
        user_id: UserId,
        month: MonthYear,
    ) -> Result<Vec<DailyListen>> {
        let totals: HashMap<String, Milliseconds> = self
            .db
            .get_daily_totals(user_id, month)
            .await?
            .into_iter()
            .collect();

        Ok(month
            .days()
            .map(|date| DailyListen {
                day_of_month: date.day(),
                date,
                total: totals.get(&format_date(date)).copied().unwrap_or_default(),
            })
            .collect())
    }

    /// Listen time on a single day.
    pub async fn listen_time_for_day(&self, user_id: UserId, date: NaiveDate) -> Result<Milliseconds> {
        self.db.get_total_listen_time_for_day(user_id, date).await
    }

    /// Drop a cached report.
    pub async fn invalidate(&self, user_id: UserId, month: MonthYear) {
        if self.cache.write().await.remove(&(user_id, month)).is_some() {
            debug!("Invalidated report for user {user_id}, {month}");
        }
    }

    /// Drop the cached report of the current month.
    pub async fn invalidate_current_month(&self, user_id: UserId) {
        self.invalidate(user_id, MonthYear::current()).await;
    }

    /// Drop every cached report.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Start polling the current month's total listen time.
    ///
    /// The returned handle owns the polling task; stop it (or drop it) when
    /// the user context ends.
    #[must_use]
    pub fn watch_current_month(&self, user_id: UserId) -> CurrentMonthWatch {
        CurrentMonthWatch::spawn(self.db.clone(), user_id, self.settings.refresh_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Song;
    use async_trait::async_trait;
    use chrono::{DateTime, Local, TimeZone};

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).earliest().unwrap()
    }

    fn jan() -> MonthYear {
        MonthYear::new(2024, 1).unwrap()
    }

    async fn service() -> AnalyticsService {
        let db = Database::open_in_memory().await.unwrap();
        for (id, title, artist) in [
            (1, "Heroes", "David Bowie"),
            (2, "Changes", "David Bowie"),
            (3, "Windowlicker", "Aphex Twin"),
            (4, "Xtal", "Aphex Twin"),
        ] {
            db.upsert_song(&Song::new(SongId::new(id), title, artist))
                .await
                .unwrap();
        }
        AnalyticsService::new(db, AnalyticsSettings::default())
    }

    async fn listen(
        service: &AnalyticsService,
        user: i64,
        song: i64,
        at: DateTime<Local>,
        ms: i64,
    ) -> SessionId {
        let recorder = service.recorder();
        let id = recorder
            .start_session_at(UserId::new(user), SongId::new(song), at)
            .await
            .unwrap();
        recorder
            .end_session_at(id, Milliseconds::new(ms), true, at)
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_empty_month_is_zero_not_error() {
        let service = service().await;
        let user = UserId::new(1);

        let report = service.monthly_analytics(user, jan()).await.unwrap();
        assert!(report.total_listen_time.is_zero());
        assert!(report.top_artists.is_empty());
        assert!(report.top_songs.is_empty());
        assert!(report.day_streak_songs.is_empty());

        let summary = service.monthly_summary(user, jan()).await.unwrap();
        assert_eq!(summary.daily_average, None);
        assert_eq!(summary.unique_artists, 0);
        assert_eq!(summary.unique_songs, 0);
        assert_eq!(summary.most_active_day, None);
        assert!(service.available_months(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_session_day_total_is_exact() {
        let service = service().await;
        let user = UserId::new(1);
        let t0 = local(2024, 1, 15, 20);

        let id = service
            .recorder()
            .start_session_at(user, SongId::new(1), t0)
            .await
            .unwrap();
        service
            .recorder()
            .end_session_at(id, Milliseconds::new(65_000), true, t0 + chrono::Duration::minutes(5))
            .await
            .unwrap();

        let day = service
            .listen_time_for_day(user, t0.date_naive())
            .await
            .unwrap();
        assert_eq!(day, Milliseconds::new(65_000));
    }

    #[tokio::test]
    async fn test_top_artists_tie_break_on_listen_time() {
        let service = service().await;
        // Two plays each; Aphex Twin has more total time
        listen(&service, 1, 1, local(2024, 1, 2, 10), 100_000).await;
        listen(&service, 1, 2, local(2024, 1, 3, 10), 100_000).await;
        listen(&service, 1, 3, local(2024, 1, 4, 10), 150_000).await;
        listen(&service, 1, 4, local(2024, 1, 5, 10), 150_000).await;

        let report = service.monthly_analytics(UserId::new(1), jan()).await.unwrap();
        let artists: Vec<&str> = report.top_artists.iter().map(|a| a.artist.as_str()).collect();
        assert_eq!(artists, vec!["Aphex Twin", "David Bowie"]);
        assert_eq!(report.top_artists[0].play_count.get(), 2);
        assert_eq!(report.top_artists[0].total, Milliseconds::new(300_000));
        assert_eq!(report.total_listen_time, Milliseconds::new(500_000));
    }

    #[tokio::test]
    async fn test_top_songs_rank_and_limit() {
        let db = Database::open_in_memory().await.unwrap();
        for id in 1..=7 {
            db.upsert_song(&Song::new(SongId::new(id), format!("Song {id}"), "Artist"))
                .await
                .unwrap();
        }
        let service = AnalyticsService::new(db, AnalyticsSettings::default());

        // Song n is played n times
        for song in 1..=7 {
            for _ in 0..song {
                listen(&service, 1, song, local(2024, 1, 10, 12), 1000).await;
            }
        }

        let report = service.monthly_analytics(UserId::new(1), jan()).await.unwrap();
        let ids: Vec<i64> = report.top_songs.iter().map(|s| s.song_id.get()).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
        assert_eq!(report.top_songs[0].title, "Song 7");
    }

    #[tokio::test]
    async fn test_top_n_setting_reaches_queries() {
        let db = Database::open_in_memory().await.unwrap();
        for id in 1..=8 {
            db.upsert_song(&Song::new(SongId::new(id), format!("Song {id}"), format!("Artist {id}")))
                .await
                .unwrap();
        }
        let settings = AnalyticsSettings {
            top_n: 7,
            ..AnalyticsSettings::default()
        };
        let service = AnalyticsService::new(db, settings);
        for song in 1..=8 {
            listen(&service, 1, song, local(2024, 1, 10, 12), 1000).await;
        }

        let report = service.monthly_analytics(UserId::new(1), jan()).await.unwrap();
        assert_eq!(report.top_songs.len(), 7);
        assert_eq!(report.top_artists.len(), 7);
    }

    #[tokio::test]
    async fn test_daily_average_skips_silent_days() {
        let service = service().await;
        let user = UserId::new(1);
        listen(&service, 1, 1, local(2024, 1, 1, 9), 60_000).await;
        listen(&service, 1, 2, local(2024, 1, 1, 18), 60_000).await;
        listen(&service, 1, 3, local(2024, 1, 20, 9), 30_000).await;

        let summary = service.monthly_summary(user, jan()).await.unwrap();
        // (120s + 30s) / 2 active days, not / 31
        assert_eq!(summary.daily_average, Some(Milliseconds::new(75_000)));
        assert_eq!(summary.unique_artists, 2);
        assert_eq!(summary.unique_songs, 3);
    }

    #[tokio::test]
    async fn test_most_active_day() {
        let service = service().await;
        // 2024-01-01 and 2024-01-08 are Mondays; 2024-01-03 is a Wednesday
        listen(&service, 1, 1, local(2024, 1, 1, 9), 10_000).await;
        listen(&service, 1, 1, local(2024, 1, 8, 9), 10_000).await;
        listen(&service, 1, 2, local(2024, 1, 3, 9), 90_000).await;

        let summary = service.monthly_summary(UserId::new(1), jan()).await.unwrap();
        let busiest = summary.most_active_day.unwrap();
        assert_eq!(busiest.weekday, chrono::Weekday::Mon);
        assert_eq!(busiest.session_count.get(), 2);

        // Equal counts fall back to listen time
        listen(&service, 1, 2, local(2024, 1, 10, 9), 1_000).await;
        let summary = service.monthly_summary(UserId::new(1), jan()).await.unwrap();
        assert_eq!(summary.most_active_day.unwrap().weekday, chrono::Weekday::Wed);
    }

    #[tokio::test]
    async fn test_months_with_sessions_most_recent_first() {
        let service = service().await;
        listen(&service, 1, 1, local(2023, 11, 5, 9), 1000).await;
        listen(&service, 1, 1, local(2024, 2, 5, 9), 1000).await;
        listen(&service, 1, 1, local(2024, 2, 6, 9), 1000).await;
        listen(&service, 1, 1, local(2023, 12, 5, 9), 1000).await;
        listen(&service, 2, 1, local(2024, 6, 5, 9), 1000).await;

        let months = service.available_months(UserId::new(1)).await.unwrap();
        let labels: Vec<String> = months.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["2024-02", "2023-12", "2023-11"]);

        let history = service.analytics_history(UserId::new(1)).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].period(), MonthYear::new(2024, 2).unwrap());
    }

    #[tokio::test]
    async fn test_streaks_are_global_and_deduplicated() {
        let service = service().await;
        let user = UserId::new(1);
        // Song 1: Jan 30, Jan 31 (twice), Feb 1 -> three days across months
        listen(&service, 1, 1, local(2024, 1, 30, 9), 10_000).await;
        listen(&service, 1, 1, local(2024, 1, 31, 9), 10_000).await;
        listen(&service, 1, 1, local(2024, 1, 31, 21), 10_000).await;
        listen(&service, 1, 1, local(2024, 2, 1, 9), 10_000).await;
        // Song 3 played on a single day only
        listen(&service, 1, 3, local(2024, 1, 30, 9), 10_000).await;

        let jan_report = service.monthly_analytics(user, jan()).await.unwrap();
        let feb_report = service
            .monthly_analytics(user, MonthYear::new(2024, 2).unwrap())
            .await
            .unwrap();

        assert_eq!(jan_report.day_streak_songs.len(), 1);
        let streak = &jan_report.day_streak_songs[0];
        assert_eq!(streak.title, "Heroes");
        assert_eq!(streak.consecutive_days, 3);
        assert_eq!(jan_report.day_streak_songs, feb_report.day_streak_songs);
    }

    #[tokio::test]
    async fn test_streak_songs_without_metadata_are_dropped() {
        let service = service().await;
        listen(&service, 1, 99, local(2024, 1, 1, 9), 1000).await;
        listen(&service, 1, 99, local(2024, 1, 2, 9), 1000).await;
        listen(&service, 1, 2, local(2024, 1, 1, 9), 1000).await;
        listen(&service, 1, 2, local(2024, 1, 2, 9), 1000).await;

        let streaks = service.day_streak_songs(UserId::new(1)).await.unwrap();
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].song_id, SongId::new(2));
    }

    struct EmptyCatalog;

    #[async_trait]
    impl SongCatalog for EmptyCatalog {
        async fn songs_by_ids(&self, _ids: &[SongId]) -> Result<Vec<Song>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_separate_catalog_is_used_for_streaks() {
        let db = Database::open_in_memory().await.unwrap();
        db.upsert_song(&Song::new(SongId::new(1), "Heroes", "David Bowie"))
            .await
            .unwrap();
        let service =
            AnalyticsService::with_catalog(db, Arc::new(EmptyCatalog), AnalyticsSettings::default());
        listen(&service, 1, 1, local(2024, 1, 1, 9), 1000).await;
        listen(&service, 1, 1, local(2024, 1, 2, 9), 1000).await;

        assert!(service.day_streak_songs(UserId::new(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_is_idempotent_and_cached_until_invalidated() {
        let service = service().await;
        let user = UserId::new(1);
        listen(&service, 1, 1, local(2024, 1, 2, 10), 40_000).await;

        let first = service.monthly_analytics(user, jan()).await.unwrap();
        let second = service.monthly_analytics(user, jan()).await.unwrap();
        assert_eq!(first, second);

        // A write behind the facade's back is not visible until invalidation
        listen(&service, 1, 2, local(2024, 1, 3, 10), 20_000).await;
        let cached = service.monthly_analytics(user, jan()).await.unwrap();
        assert_eq!(cached.total_listen_time, Milliseconds::new(40_000));

        service.invalidate(user, jan()).await;
        let fresh = service.monthly_analytics(user, jan()).await.unwrap();
        assert_eq!(fresh.total_listen_time, Milliseconds::new(60_000));
    }

    #[tokio::test]
    async fn test_facade_writes_invalidate_current_month() {
        let service = service().await;
        let user = UserId::new(1);
        let now = MonthYear::current();

        let before = service.monthly_analytics(user, now).await.unwrap();
        assert!(before.total_listen_time.is_zero());

        let id = service.start_session(user, SongId::new(1)).await.unwrap();
        service
            .end_session(user, id, Milliseconds::new(12_345), false)
            .await
            .unwrap();

        let after = service.monthly_analytics(user, now).await.unwrap();
        assert_eq!(after.total_listen_time, Milliseconds::new(12_345));
        assert_eq!(after.top_songs[0].title, "Heroes");
    }

    #[tokio::test]
    async fn test_end_session_invalidates_start_month() {
        let service = service().await;
        let user = UserId::new(1);

        let id = service
            .recorder()
            .start_session_at(user, SongId::new(1), local(2024, 1, 31, 23))
            .await
            .unwrap();
        let cached = service.monthly_analytics(user, jan()).await.unwrap();
        assert!(cached.total_listen_time.is_zero());

        service
            .end_session(user, id, Milliseconds::new(600_000), true)
            .await
            .unwrap();

        let report = service.monthly_analytics(user, jan()).await.unwrap();
        assert_eq!(report.total_listen_time, Milliseconds::new(600_000));
    }

    #[tokio::test]
    async fn test_zero_length_sessions_count_as_listening_days() {
        let service = service().await;
        let user = UserId::new(1);
        listen(&service, 1, 1, local(2024, 1, 2, 9), 90_000).await;
        // Instant skip: a session with no listen time
        listen(&service, 1, 2, local(2024, 1, 3, 9), 0).await;

        let summary = service.monthly_summary(user, jan()).await.unwrap();
        assert_eq!(summary.days_listened, 2);
        assert_eq!(summary.daily_average, Some(Milliseconds::new(45_000)));
    }

    #[tokio::test]
    async fn test_daily_listen_data_is_zero_filled() {
        let service = service().await;
        listen(&service, 1, 1, local(2024, 2, 3, 9), 120_000).await;
        listen(&service, 1, 2, local(2024, 2, 3, 10), 60_000).await;
        listen(&service, 1, 2, local(2024, 2, 29, 10), 60_000).await;

        let feb = MonthYear::new(2024, 2).unwrap();
        let days = service.daily_listen_data(UserId::new(1), feb).await.unwrap();
        assert_eq!(days.len(), 29);
        assert_eq!(days[0].total, Milliseconds::default());
        assert_eq!(days[2].day_of_month, 3);
        assert_eq!(days[2].total, Milliseconds::new(180_000));
        assert_eq!(days[28].total, Milliseconds::new(60_000));
    }

    #[tokio::test]
    async fn test_analytics_for_months_keeps_order() {
        let service = service().await;
        listen(&service, 1, 1, local(2024, 1, 2, 10), 1000).await;
        let months = [MonthYear::new(2023, 12).unwrap(), jan()];

        let reports = service
            .analytics_for_months(UserId::new(1), &months)
            .await
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].total_listen_time.is_zero());
        assert_eq!(reports[1].total_listen_time, Milliseconds::new(1000));
    }
}
