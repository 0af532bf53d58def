//! Logging setup: console plus a daily-rotated file.
//!
//! Both sinks share the fmt layer's line format. The file appender writes
//! one file per calendar day under the configured directory; the returned
//! guard must be held for the lifetime of the process so buffered lines
//! are flushed on exit.

use std::path::Path;

use anyhow::Context as _;
use tracing_appender::non_blocking::WorkerGuard;

/// Initialize the global tracing subscriber.
///
/// `level` is the default filter; the `RUST_LOG` environment variable
/// overrides it when set.
pub fn init(level: &str, log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory '{}'", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "mailpush.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let console_layer = tracing_subscriber::fmt::layer();
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
