//! `mailpush` — relay unread mail from a watched sender to a chat webhook.
//!
//! One poll cycle is a linear pipeline: open an IMAP session, search for
//! unseen messages from the watched sender, fetch each one, post-filter on
//! the exact sender address, convert the body to markdown, and publish the
//! result to the configured webhook. The server-side `\Seen` flag is the
//! only idempotency mechanism; nothing is persisted locally except logs.

pub mod config;
pub mod error;
pub mod mail;
pub mod notify;
pub mod poller;
pub mod telemetry;

pub use error::SourceError;

/// Convenience alias used throughout the crate.
pub type Result<T> = anyhow::Result<T>;
