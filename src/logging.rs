use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_rolling_file::{RollingConditionBase, RollingFileAppender};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LoggingConfig;

/// Guard that keeps the non-blocking file writer alive and flushes it on drop.
/// Hold this for the lifetime of the process.
pub struct LogGuard(Option<WorkerGuard>);

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Some(guard) = self.0.take() {
            drop(guard);
            // Give the background writer a moment to flush
            std::thread::sleep(std::time::Duration::from_millis(200));
        }
    }
}

fn parse_level(config: Option<&LoggingConfig>) -> Level {
    match config {
        Some(config) => match config.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        },
        None => Level::INFO,
    }
}

/// Initialize logging to the console and, when a [`LoggingConfig`] is given,
/// to a size-rolled log file as well.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<LogGuard, anyhow::Error> {
    let level = parse_level(config);
    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(level);

    let console = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(level_filter);

    let Some(config) = config else {
        tracing_subscriber::registry().with(console).init();
        return Ok(LogGuard(None));
    };

    if let Some(parent) = Path::new(&config.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_appender = RollingFileAppender::new(
        &config.path,
        RollingConditionBase::new().max_size(config.size * 1024 * 1024),
        config.max_files,
    )
    .map_err(|e| anyhow::anyhow!("Failed to create rolling file appender: {}", e))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(console)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(level_filter),
        )
        .init();

    Ok(LogGuard(Some(guard)))
}
