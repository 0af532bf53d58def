//! Error taxonomy for the mail source.
//!
//! Each variant aborts the poll cycle that produced it; the poll loop logs
//! it and tries again at the next interval. Per-message problems (a failed
//! fetch, unparseable MIME) are handled inside the source and never
//! surface here.

use thiserror::Error;

/// Cycle-level failures while talking to the IMAP server.
#[derive(Error, Debug)]
pub enum SourceError {
    /// TLS connector construction failed before any connection was made.
    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    /// The server was unreachable or the transport handshake failed.
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: imap::Error,
    },

    /// The server rejected the configured credentials.
    #[error("authentication rejected for '{username}': {source}")]
    Auth {
        username: String,
        #[source]
        source: imap::Error,
    },

    /// The mailbox folder could not be selected.
    #[error("failed to select folder '{folder}': {source}")]
    Folder {
        folder: String,
        #[source]
        source: imap::Error,
    },

    /// The UNSEEN+FROM search command failed.
    #[error("mailbox search failed: {0}")]
    Search(#[source] imap::Error),
}
