//! # Listening Analytics
//!
//! Listening-session analytics for a music player.
//!
//! This crate provides:
//! - A session recorder that opens and closes one row per playback
//! - DuckDB-backed monthly aggregations (totals, averages, top lists)
//! - Per-song consecutive-day streak detection
//! - A cached monthly report facade with a live current-month view
//! - Comma-delimited report export

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod export;
pub mod period;
pub mod recorder;
pub mod types;

pub use analytics::{AnalyticsService, AnalyticsSettings, MonthlyAnalytics};
pub use catalog::{Song, SongCatalog};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use period::MonthYear;
pub use recorder::SessionRecorder;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "listening-analytics";
