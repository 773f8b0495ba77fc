//! # playtime-logging
//!
//! Logging for the playtime tracker.
//!
//! ## Key Types
//!
//! - [`Logger`] - Console and file output of tracker events
//! - [`LogEvent`] - Log event types
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)
//!
//! Diagnostics that are not part of the event stream go through `tracing`,
//! configured by [`init_tracing`].

mod events;

pub use events::{LogEvent, LogFormat, Logger};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix of the rolling diagnostics log
pub const DIAGNOSTICS_FILE: &str = "playtime.log";

/// Initialize tracing for the application.
///
/// When `diagnostics_dir` is set, diagnostics are also written to a daily
/// rolling file there. Keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init_tracing(
    level: &str,
    format: LogFormat,
    diagnostics_dir: Option<&Path>,
) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match diagnostics_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, DIAGNOSTICS_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    match format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }

    guard
}
