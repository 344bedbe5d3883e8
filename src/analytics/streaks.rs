//! Per-song day streaks.
//!
//! A streak is the longest run of calendar-consecutive days on which a song
//! was played at least once. How long or how often it was played on a day
//! does not matter.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::period::parse_date;
use crate::types::SongId;

/// Shortest run that is reported.
pub const MIN_STREAK_DAYS: u32 = 2;

/// Default number of songs in a streak list.
pub const DEFAULT_STREAK_LIMIT: usize = 10;

/// Longest consecutive-day run of one song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongStreak {
    pub song_id: SongId,
    pub consecutive_days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Longest run within sorted, distinct dates as `(length, start, end)`.
fn longest_run(dates: &[NaiveDate]) -> Option<(u32, NaiveDate, NaiveDate)> {
    let (&first, rest) = dates.split_first()?;

    let mut best = (1, first, first);
    let mut run = 1;
    let mut run_start = first;
    let mut prev = first;

    for &date in rest {
        let diff = date.signed_duration_since(prev).num_days();
        if diff == 1 {
            run += 1;
        } else {
            run = 1;
            run_start = date;
        }
        // Strictly greater keeps the earliest of equally long runs
        if run > best.0 {
            best = (run, run_start, date);
        }
        prev = date;
    }

    Some(best)
}

/// Compute the top day streaks from (song, `yyyy-MM-dd`) pairs.
///
/// Pairs may repeat; each song's dates are deduplicated before scanning.
/// Songs whose longest run is shorter than [`MIN_STREAK_DAYS`] are left
/// out. Results are ordered by run length, longest first (ties: most recent
/// end date, then song id), and truncated to `limit`.
pub fn top_day_streaks<I, S>(plays: I, limit: usize) -> Vec<SongStreak>
where
    I: IntoIterator<Item = (SongId, S)>,
    S: AsRef<str>,
{
    // BTreeSet sorts lexicographically, which is chronological for
    // zero-padded ISO dates
    let mut by_song: BTreeMap<SongId, BTreeSet<String>> = BTreeMap::new();
    for (song_id, date) in plays {
        by_song
            .entry(song_id)
            .or_default()
            .insert(date.as_ref().to_string());
    }

    let mut streaks: Vec<SongStreak> = by_song
        .into_iter()
        .filter_map(|(song_id, date_strings)| {
            let dates: Vec<NaiveDate> = date_strings
                .iter()
                .filter_map(|s| match parse_date(s) {
                    Ok(date) => Some(date),
                    Err(e) => {
                        warn!("Skipping play date for song {song_id}: {e}");
                        None
                    }
                })
                .collect();

            let (days, start_date, end_date) = longest_run(&dates)?;
            (days >= MIN_STREAK_DAYS).then_some(SongStreak {
                song_id,
                consecutive_days: days,
                start_date,
                end_date,
            })
        })
        .collect();

    streaks.sort_by(|a, b| {
        b.consecutive_days
            .cmp(&a.consecutive_days)
            .then_with(|| b.end_date.cmp(&a.end_date))
            .then_with(|| a.song_id.cmp(&b.song_id))
    });
    streaks.truncate(limit);
    streaks
}
