//! CLI entry point for `mailpush`.

use std::path::PathBuf;

use clap::Parser;

use mailpush::config::Config;
use mailpush::{poller, telemetry};

#[derive(Parser)]
#[command(name = "mailpush", version, about = "Relay unread mail from a watched sender to a chat webhook")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let _log_guard = telemetry::init(&config.log.level, &config.log.directory)?;

    tracing::info!(
        sender = %config.filter.sender,
        folder = %config.imap.folder,
        interval_secs = config.poll.interval_secs,
        level = %config.log.level,
        "starting mailbox-to-webhook relay"
    );

    poller::run(config).await
}
