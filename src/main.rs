//! Listening Analytics - Main entry point
//!
//! Records sessions and prints, exports or watches monthly listening reports.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use listening_analytics::{
    display,
    types::{Milliseconds, SessionId, SongId, UserId},
    AnalyticsService, AnalyticsSettings, Config, Database, Error, MonthYear, Result, Song,
};

#[derive(Parser)]
#[command(name = "listening-analytics")]
#[command(author, version, about = "Listening session analytics and monthly reports")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Listener id (defaults to general.user_id from the config)
    #[arg(short, long, global = true, env = "LISTENING_ANALYTICS_USER")]
    user: Option<i64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a listening session for a song
    Start {
        /// Song id from the catalog
        song: i64,
    },

    /// Close a listening session
    End {
        /// Session id (defaults to the active session)
        #[arg(long)]
        session: Option<i64>,

        /// Time actually listened, in milliseconds
        #[arg(long)]
        duration_ms: i64,

        /// Whether the song played to the end
        #[arg(long)]
        completed: bool,
    },

    /// Show the active session
    Active,

    /// Show a monthly report
    Report {
        /// Year (defaults to the current month)
        #[arg(long, requires = "month")]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(long, requires = "year")]
        month: Option<u32>,

        /// Length of the top artist and song lists (defaults to analytics.top_n)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List months that have listening data
    Months,

    /// Export a monthly report as comma-delimited text
    Export {
        #[arg(long, requires = "month")]
        year: Option<i32>,

        #[arg(long, requires = "year")]
        month: Option<u32>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Follow the current month's listen time until interrupted
    Watch,

    /// Manage the song catalog mirror
    Song {
        #[command(subcommand)]
        action: SongAction,
    },

    /// Show or edit configuration
    Config {
        /// Print current configuration
        #[arg(long)]
        show: bool,

        /// Create default configuration file
        #[arg(long)]
        init: bool,
    },

    /// Database operations
    Db {
        /// Show database path and stats
        #[arg(long)]
        info: bool,
    },
}

#[derive(Subcommand)]
enum SongAction {
    /// Add or replace a song
    Add {
        id: i64,
        title: String,
        artist: String,
        #[arg(long)]
        artwork: Option<String>,
    },
    /// Remove a song
    Remove { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let config = if let Some(ref path) = cli.config {
        Config::load_from(path)?
    } else {
        Config::load()?
    };
    config.validate()?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(&config.general.log_level)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let user = cli.user.map_or_else(|| config.user_id(), UserId::new);

    match cli.command {
        Some(Commands::Config { show, init }) => {
            if init {
                let default_config = Config::default();
                default_config.save()?;
                println!(
                    "Created default configuration at {}",
                    Config::config_path()?.display()
                );
            } else if show {
                let contents = toml::to_string_pretty(&config)?;
                println!("{contents}");
            } else {
                println!("Configuration path: {}", Config::config_path()?.display());
            }
            Ok(())
        }

        Some(Commands::Db { info }) => {
            if info {
                let db = open_database(&config).await?;
                let count = db.get_session_count().await?;
                println!("Database path: {}", config.database_path()?.display());
                println!("Total sessions: {count}");
            }
            Ok(())
        }

        Some(Commands::Song { action }) => {
            let db = open_database(&config).await?;
            match action {
                SongAction::Add {
                    id,
                    title,
                    artist,
                    artwork,
                } => {
                    let mut song = Song::new(SongId::new(id), title, artist);
                    song.artwork = artwork;
                    db.upsert_song(&song).await?;
                    println!("Saved song {id}: {} - {}", song.title, song.artist);
                }
                SongAction::Remove { id } => {
                    db.delete_song(SongId::new(id)).await?;
                    println!("Removed song {id}");
                }
            }
            Ok(())
        }

        Some(command) => {
            let top_n = match &command {
                Commands::Report { limit, .. } => *limit,
                _ => None,
            };
            let service = open_service(&config, top_n).await?;
            run_command(&service, user, command).await
        }

        None => {
            // Default: current month's report
            let service = open_service(&config, None).await?;
            run_report(&service, user, MonthYear::current()).await
        }
    }
}

async fn open_database(config: &Config) -> Result<Database> {
    let data_dir = config.data_dir()?;
    Database::new(&config.database, &data_dir).await
}

async fn open_service(config: &Config, top_n: Option<u32>) -> Result<AnalyticsService> {
    let db = open_database(config).await?;
    let mut settings = AnalyticsSettings::from_config(&config.analytics)?;
    if let Some(top_n) = top_n {
        settings.top_n = top_n;
    }
    Ok(AnalyticsService::new(db, settings))
}

fn period(year: Option<i32>, month: Option<u32>) -> Result<MonthYear> {
    match (year, month) {
        (Some(year), Some(month)) => MonthYear::new(year, month),
        _ => Ok(MonthYear::current()),
    }
}

async fn run_command(service: &AnalyticsService, user: UserId, command: Commands) -> Result<()> {
    match command {
        Commands::Start { song } => {
            // One open session per user; the caller enforces it
            if let Some(active) = service.recorder().get_active_session(user).await? {
                return Err(Error::other(format!(
                    "user {user} already has active session {} (song {}); end it first",
                    active.id, active.song_id
                )));
            }
            let id = service.start_session(user, SongId::new(song)).await?;
            println!("Started session {id}");
            Ok(())
        }

        Commands::End {
            session,
            duration_ms,
            completed,
        } => {
            let session_id = match session {
                Some(id) => Some(SessionId::new(id)),
                None => service
                    .recorder()
                    .get_active_session(user)
                    .await?
                    .map(|s| s.id),
            };
            let Some(session_id) = session_id else {
                println!("No active session for user {user}");
                return Ok(());
            };
            service
                .end_session(user, session_id, Milliseconds::new(duration_ms), completed)
                .await?;
            println!("Ended session {session_id}");
            Ok(())
        }

        Commands::Active => {
            match service.recorder().get_active_session(user).await? {
                Some(session) => println!(
                    "Session {} - song {} since {}",
                    session.id, session.song_id, session.date_string
                ),
                None => println!("No active session for user {user}"),
            }
            Ok(())
        }

        Commands::Report {
            year, month, json, ..
        } => {
            let month = period(year, month)?;
            if json {
                let report = service.monthly_analytics(user, month).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            } else {
                run_report(service, user, month).await
            }
        }

        Commands::Months => {
            let months = service.available_months(user).await?;
            if months.is_empty() {
                println!("No listening data yet.");
            }
            for month in months {
                println!("  {month}  {}", month.label());
            }
            Ok(())
        }

        Commands::Export {
            year,
            month,
            output,
        } => {
            let month = period(year, month)?;
            let report = service.monthly_analytics(user, month).await?;
            let summary = service.monthly_summary(user, month).await?;
            let daily = service.daily_listen_data(user, month).await?;
            listening_analytics::export::write_report(&output, &report, &summary, &daily)?;
            println!("Wrote {}", output.display());
            Ok(())
        }

        Commands::Watch => run_watch(service, user).await,

        Commands::Song { .. } | Commands::Config { .. } | Commands::Db { .. } => Ok(()),
    }
}

async fn run_report(
    service: &AnalyticsService,
    user: UserId,
    month: MonthYear,
) -> Result<()> {
    let report = service.monthly_analytics(user, month).await?;
    let summary = service.monthly_summary(user, month).await?;

    display::print_section(&format!(
        "LISTENING REPORT - {}",
        month.label().to_uppercase()
    ));
    println!();

    if report.total_listen_time.is_zero() && report.top_songs.is_empty() {
        println!("No listening data found for this month.");
        return Ok(());
    }

    display::print_section_simple("OVERVIEW");
    display::display_summary(&summary);

    display::print_section_simple("TOP ARTISTS");
    display::display_top_artists(&report.top_artists);

    display::print_section_simple("TOP SONGS");
    display::display_top_songs(&report.top_songs);

    if !report.day_streak_songs.is_empty() {
        display::print_section_simple("DAY STREAKS (ALL TIME)");
        display::display_streaks(&report.day_streak_songs);
    }

    display::print_section_simple("DAILY LISTENING");
    let daily = service.daily_listen_data(user, month).await?;
    display::display_daily(&daily);

    println!("\n{}\n", "=".repeat(50));

    Ok(())
}

async fn run_watch(service: &AnalyticsService, user: UserId) -> Result<()> {
    use tokio::signal;

    let mut watch = service.watch_current_month(user);
    println!(
        "Watching {} for user {user} (Ctrl+C to stop)",
        MonthYear::current().label()
    );

    loop {
        tokio::select! {
            changed = watch.changed() => {
                let total = changed?;
                println!("  {total} this month");
            }
            _ = signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    watch.stop().await
}
