//! Display utilities for formatting statistics output.
//!
//! Shared formatting used by the CLI when printing monthly reports.
//!
//! # Functions
//!
//! - [`truncate`] - Truncate strings to a maximum length with ellipsis
//! - [`make_bar`] - Create visual bar charts for relative values
//! - [`print_section`] / [`print_section_simple`] - Print section headers
//! - [`display_summary`] / [`display_top_artists`] / etc. - Display formatted stats

use crate::analytics::{DailyListen, DayStreakSong, MonthlySummary};
use crate::db::{ArtistStats, SongStats};
use crate::period::format_date;

/// Truncate a string to a maximum length, adding "..." if truncated.
///
/// Counts characters rather than bytes.
/// For `max_len < 3`, truncates without ellipsis since there's no room for "...".
///
/// # Examples
///
/// ```
/// use listening_analytics::display::truncate;
///
/// assert_eq!(truncate("hello", 10), "hello");
/// assert_eq!(truncate("hello world", 8), "hello...");
/// assert_eq!(truncate("hello", 2), "he");
/// ```
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len < 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

/// Create a visual bar for displaying relative values.
///
/// # Arguments
///
/// * `value` - The value to represent (negative values treated as 0)
/// * `max_value` - The maximum value (determines 100% width)
/// * `width` - The total width of the bar in characters
#[must_use]
pub fn make_bar(value: i64, max_value: i64, width: usize) -> String {
    if max_value <= 0 || value <= 0 {
        return " ".repeat(width);
    }
    let ratio = (value as f64 / max_value as f64).clamp(0.0, 1.0);
    let filled = (ratio * width as f64) as usize;
    let empty = width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Print a section header with equals signs.
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(50));
    println!("  {title}");
    println!("{}", "=".repeat(50));
}

/// Print a simple section header with dashes.
pub fn print_section_simple(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(30));
}

/// Display the month's headline figures.
pub fn display_summary(summary: &MonthlySummary) {
    println!(
        "  Listening time:   {:>10.1} hours",
        summary.total_listen_time.as_hours_f64()
    );
    println!("  Days listened:    {:>10}", summary.days_listened);
    match summary.daily_average {
        Some(avg) => println!("  Daily average:    {:>10.1} min", avg.as_minutes_f64()),
        None => println!("  Daily average:    {:>10}", "-"),
    }
    println!("  Unique artists:   {:>10}", summary.unique_artists);
    println!("  Unique songs:     {:>10}", summary.unique_songs);
    if let Some(ref day) = summary.most_active_day {
        println!(
            "  Most active day:  {:>10} ({} sessions, {})",
            day.weekday.to_string(),
            day.session_count,
            day.total
        );
    }
}

/// Display top artists list.
pub fn display_top_artists(artists: &[ArtistStats]) {
    let max_plays = artists.first().map_or(1, |a| a.play_count.get());

    for (i, artist) in artists.iter().enumerate() {
        let bar = make_bar(artist.play_count.get(), max_plays, 20);
        println!(
            "  {:2}. {:<30} {} {:>4} plays ({})",
            i + 1,
            truncate(&artist.artist, 30),
            bar,
            artist.play_count.get(),
            artist.total
        );
    }
}

/// Display top songs list.
pub fn display_top_songs(songs: &[SongStats]) {
    let max_plays = songs.first().map_or(1, |s| s.play_count.get());

    for (i, song) in songs.iter().enumerate() {
        let bar = make_bar(song.play_count.get(), max_plays, 15);
        println!(
            "  {:2}. {:<25} - {:<15} {} {:>3}",
            i + 1,
            truncate(&song.title, 25),
            truncate(&song.artist, 15),
            bar,
            song.play_count.get()
        );
    }
}

/// Display day streak songs.
pub fn display_streaks(streaks: &[DayStreakSong]) {
    for (i, streak) in streaks.iter().enumerate() {
        println!(
            "  {:2}. {:<25} - {:<15} {:>3} days ({} to {})",
            i + 1,
            truncate(&streak.title, 25),
            truncate(&streak.artist, 15),
            streak.consecutive_days,
            format_date(streak.start_date),
            format_date(streak.end_date)
        );
    }
}

/// Display a per-day bar chart of listen time.
pub fn display_daily(days: &[DailyListen]) {
    let max_ms = days.iter().map(|d| d.total.get()).max().unwrap_or(0);

    for day in days {
        let bar = make_bar(day.total.get(), max_ms, 30);
        println!(
            "  {} {} {:>6.1} min",
            format_date(day.date),
            bar,
            day.total.as_minutes_f64()
        );
    }
}
