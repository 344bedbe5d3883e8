//! Shareable monthly report as comma-delimited text.
//!
//! Layout: a summary block, then "Top Artists", "Top Songs", "Day Streak
//! Songs" and "Daily Listen Data" tables. Each block ends with a blank line.

use std::path::Path;

use tracing::info;

use crate::analytics::{DailyListen, MonthlyAnalytics, MonthlySummary};
use crate::error::Result;
use crate::period::format_date;
use crate::types::Milliseconds;

/// Quote a field if it contains a delimiter, quote or line break.
#[must_use]
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn minutes(ms: Milliseconds) -> String {
    format!("{:.1}", ms.as_minutes_f64())
}

fn push_row<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let row: Vec<String> = fields
        .into_iter()
        .map(|f| escape_field(f.as_ref()))
        .collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

/// Render a report together with its summary and per-day totals.
#[must_use]
pub fn export_report(
    analytics: &MonthlyAnalytics,
    summary: &MonthlySummary,
    daily: &[DailyListen],
) -> String {
    let mut out = String::new();

    let period = analytics.period().label();
    push_row(&mut out, ["Monthly Listening Report"]);
    push_row(&mut out, ["Period", period.as_str()]);
    push_row(
        &mut out,
        [
            "Total Listen Time (min)".to_string(),
            minutes(analytics.total_listen_time),
        ],
    );
    push_row(
        &mut out,
        ["Days Listened".to_string(), summary.days_listened.to_string()],
    );
    push_row(
        &mut out,
        [
            "Daily Average (min)".to_string(),
            summary.daily_average.map_or_else(|| "-".to_string(), minutes),
        ],
    );
    out.push('\n');

    push_row(&mut out, ["Top Artists"]);
    push_row(&mut out, ["Rank", "Artist", "Play Count", "Duration (min)"]);
    for (i, artist) in analytics.top_artists.iter().enumerate() {
        push_row(
            &mut out,
            [
                (i + 1).to_string(),
                artist.artist.clone(),
                artist.play_count.to_string(),
                minutes(artist.total),
            ],
        );
    }
    out.push('\n');

    push_row(&mut out, ["Top Songs"]);
    push_row(
        &mut out,
        ["Rank", "Title", "Artist", "Play Count", "Duration (min)"],
    );
    for (i, song) in analytics.top_songs.iter().enumerate() {
        push_row(
            &mut out,
            [
                (i + 1).to_string(),
                song.title.clone(),
                song.artist.clone(),
                song.play_count.to_string(),
                minutes(song.total),
            ],
        );
    }
    out.push('\n');

    push_row(&mut out, ["Day Streak Songs"]);
    push_row(
        &mut out,
        [
            "Rank",
            "Title",
            "Artist",
            "Consecutive Days",
            "Start Date",
            "End Date",
        ],
    );
    for (i, streak) in analytics.day_streak_songs.iter().enumerate() {
        push_row(
            &mut out,
            [
                (i + 1).to_string(),
                streak.title.clone(),
                streak.artist.clone(),
                streak.consecutive_days.to_string(),
                format_date(streak.start_date),
                format_date(streak.end_date),
            ],
        );
    }
    out.push('\n');

    push_row(&mut out, ["Daily Listen Data"]);
    push_row(&mut out, ["Day", "Date", "Minutes"]);
    for day in daily {
        push_row(
            &mut out,
            [
                day.day_of_month.to_string(),
                format_date(day.date),
                minutes(day.total),
            ],
        );
    }

    out
}

/// Render a report and write it to `path`.
pub fn write_report(
    path: &Path,
    analytics: &MonthlyAnalytics,
    summary: &MonthlySummary,
    daily: &[DailyListen],
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, export_report(analytics, summary, daily))?;
    info!("Exported {} report to {}", analytics.period(), path.display());
    Ok(())
}
