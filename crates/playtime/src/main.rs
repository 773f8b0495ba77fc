mod config;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

use playtime_core::{PlaytimeTracker, TrackerRunner};
use playtime_follow::LogFollower;
use playtime_logging::{LogEvent, LogFormat, Logger};
use playtime_snapshots::SnapshotWriter;

use config::{CliOverrides, Settings, TrackerConfig};
use report::ReportAction;

#[derive(Parser, Debug)]
#[command(
    name = "playtime",
    about = "Tracks daily player playtime from a live Minecraft server log",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Folder the daily playtime snapshots are written to (default: /data/timelog/)
    #[arg(long, global = true)]
    output_log_path: Option<PathBuf>,

    /// Minecraft log file to follow (default: /data/logs/latest.log)
    #[arg(long)]
    minecraft_log_path: Option<PathBuf>,

    /// Config file (default: ./playtime.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormatChoice>,

    /// Diagnostics level, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective settings and exit
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect written snapshots
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let config = TrackerConfig::discover(cli.config.as_deref(), &working_dir)?;
    let settings = Settings::resolve(
        CliOverrides {
            output_dir: cli.output_log_path.clone(),
            log_path: cli.minecraft_log_path.clone(),
            log_format: cli.log_format.map(Into::into),
            log_level: cli.log_level.clone(),
        },
        config,
    );

    if let Some(Command::Report { action }) = cli.command {
        return report::handle_report_command(action, &settings.output_dir);
    }

    if cli.dry_run {
        print_settings(&settings);
        return Ok(());
    }

    let _guard = playtime_logging::init_tracing(
        &settings.log_level,
        settings.log_format,
        settings.diagnostics_dir.as_deref(),
    );

    let exit_code = watch(settings).await?;
    std::process::exit(exit_code);
}

/// Follow the server log until interrupted. Returns the process exit code.
async fn watch(settings: Settings) -> Result<i32> {
    let logger = match settings.event_log {
        Some(ref path) => Logger::with_file(settings.log_format, path)
            .with_context(|| format!("Failed to open event log {}", path.display()))?,
        None => Logger::new(settings.log_format),
    };
    let logger = Arc::new(logger);

    let mut follower = LogFollower::open(&settings.log_path, settings.poll_interval)?;
    logger.log(&LogEvent::TailStarted {
        log_path: settings.log_path.clone(),
        output_dir: settings.output_dir.clone(),
    });

    let tracker = PlaytimeTracker::new(
        Utc::now(),
        SnapshotWriter::new(&settings.output_dir),
        logger.clone(),
    );
    let mut runner = TrackerRunner::new(tracker, logger.clone());

    // Write out the current day on SIGINT/SIGTERM
    let shutdown = runner.shutdown_handle();
    let signal_logger = logger.clone();
    ctrlc::set_handler(move || {
        if shutdown.request() {
            signal_logger.log(&LogEvent::ShutdownRequested);
        } else {
            signal_logger.log(&LogEvent::ShutdownIgnored);
        }
    })
    .context("Failed to set termination signal handler")?;

    let outcome = runner.run(&mut follower).await?;
    tracing::info!(?outcome, "Tracker stopped");

    Ok(outcome.exit_code())
}

fn print_settings(settings: &Settings) {
    println!("=== Dry Run ===");
    println!("Log file: {}", settings.log_path.display());
    println!("Snapshot dir: {}", settings.output_dir.display());
    println!("Log format: {:?}", settings.log_format);
    println!("Log level: {}", settings.log_level);
    println!("Poll interval: {:?}", settings.poll_interval);
    if let Some(ref path) = settings.event_log {
        println!("Event log: {}", path.display());
    }
    if let Some(ref dir) = settings.diagnostics_dir {
        println!("Diagnostics: {}", dir.display());
    }
}
