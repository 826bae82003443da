use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

type Timer = OffsetTime<time::format_description::well_known::Rfc3339>;

fn timer() -> Timer {
    OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
        // Fallback to UTC if local time fails (can happen in some environments)
        OffsetTime::new(
            time::UtcOffset::UTC,
            time::format_description::well_known::Rfc3339,
        )
    })
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Console-only logging on stderr, for one-shot commands.
pub fn init_console(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(timer())
                .with_target(false),
        )
        .with(filter(verbose))
        .try_init();
}

/// Console plus a daily rolling file under `logs_dir`, for the server.
///
/// The returned guard flushes the file writer when dropped.
pub fn init_with_file(
    verbose: bool,
    logs_dir: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("postboard")
        .filename_suffix("log")
        .build(logs_dir)
        .context("Failed to create log file appender")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let timer = timer();

    tracing_subscriber::registry()
        // File layer with full details
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_timer(timer.clone())
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        // Console layer
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(timer)
                .with_target(false),
        )
        .with(filter(verbose))
        .try_init()
        .context("Logging was already initialized")?;

    tracing::info!("Log files are being written to: {}", logs_dir.display());

    Ok(guard)
}
