//! Poll loop: drives one mailbox cycle per interval.
//!
//! A cycle is fetch → render → publish, serially, in mailbox search order.
//! The blocking IMAP client runs on the blocking pool; everything else on
//! the runtime. Cycle failures (including a panicked fetch task) are
//! logged and the loop continues — a single bad cycle never takes the
//! service down. Shutdown is observed between cycles only: an in-flight
//! cycle runs to completion first.

use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::config::Config;
use crate::mail::source;
use crate::notify::{WebhookPublisher, format};

/// Run the relay until interrupted.
pub async fn run(config: Config) -> crate::Result<()> {
    let publisher = WebhookPublisher::new(&config.webhook)?;
    let interval = Duration::from_secs(config.poll.interval_secs.max(1));

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for interrupt signal");
            // Dropping the sender would make `changed()` fire every
            // iteration; park instead so the loop keeps its cadence.
            std::future::pending::<()>().await;
        }
        shutdown_tx.send(true).ok();
    });

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let started = Instant::now();
        run_cycle(&config, &publisher).await;
        let elapsed = started.elapsed();

        match remaining_sleep(elapsed, interval) {
            Some(remaining) => {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(remaining) => {}
                }
            }
            None => {
                tracing::warn!(
                    elapsed_secs = elapsed.as_secs_f64(),
                    interval_secs = interval.as_secs(),
                    "cycle overran the poll interval, starting next cycle immediately"
                );
            }
        }
    }

    tracing::info!("interrupt received, shutting down");
    Ok(())
}

/// One poll cycle. Errors are contained here.
async fn run_cycle(config: &Config, publisher: &WebhookPublisher) {
    let imap_config = config.imap.clone();
    let sender_filter = config.filter.sender.clone();

    let fetched = tokio::task::spawn_blocking(move || {
        source::fetch_unread_from_sender(&imap_config, &sender_filter)
    })
    .await;

    match fetched {
        Ok(Ok(envelopes)) => {
            for envelope in &envelopes {
                let notification = format::render(envelope);
                publisher.publish(&notification).await;
            }
        }
        Ok(Err(error)) => tracing::error!(%error, "mail poll cycle failed"),
        Err(error) => tracing::error!(%error, "mail poll task panicked"),
    }
}

/// How long to sleep after a cycle, or `None` when the cycle overran the
/// interval and the next one should start immediately.
fn remaining_sleep(elapsed: Duration, interval: Duration) -> Option<Duration> {
    if elapsed < interval {
        Some(interval - elapsed)
    } else {
        None
    }
}
