//! Mail source adapter: IMAP polling with an exact-sender post-filter.
//!
//! The server-side `UNSEEN FROM` search is a substring match on the From
//! header, so every fetched message is re-validated against the exact
//! configured address before it is forwarded. Whatever the disposition,
//! a message whose fetch succeeded is flagged `\Seen` exactly once, which
//! is the only thing keeping it from being offered again next cycle.

use anyhow::Context as _;
use mailparse::{MailAddr, MailHeaderMap};

use crate::config::ImapConfig;
use crate::error::SourceError;
use crate::mail::extract;

type ImapSession = imap::Session<native_tls::TlsStream<std::net::TcpStream>>;

/// Owned projection of one relayable message, built while the IMAP session
/// is still open so nothing borrows the raw fetch buffer afterwards.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Exact sender address, as matched against the filter.
    pub sender: String,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub to: Option<String>,
    /// Extracted markdown body, never empty.
    pub body: String,
}

/// Poll the mailbox once.
///
/// Returns the unread messages from `sender_filter`, each already flagged
/// `\Seen`. An empty vector means no matching unread mail. Cycle-level
/// failures (connect, auth, select, search) abort the poll; per-message
/// failures are logged and skipped.
pub fn fetch_unread_from_sender(
    config: &ImapConfig,
    sender_filter: &str,
) -> Result<Vec<Envelope>, SourceError> {
    let mut session = open_session(config)?;
    let result = collect_unread(&mut session, config, sender_filter);

    // Best-effort logout on every exit path.
    if let Err(error) = session.logout() {
        tracing::debug!(%error, "IMAP logout failed");
    }

    result
}

fn open_session(config: &ImapConfig) -> Result<ImapSession, SourceError> {
    let tls = native_tls::TlsConnector::builder().build()?;

    let client = imap::connect(
        (config.host.as_str(), config.port),
        config.host.as_str(),
        &tls,
    )
    .map_err(|source| SourceError::Connect {
        host: config.host.clone(),
        port: config.port,
        source,
    })?;

    let session = client
        .login(config.username.as_str(), config.password.as_str())
        .map_err(|(source, _client)| SourceError::Auth {
            username: config.username.clone(),
            source,
        })?;

    Ok(session)
}

fn collect_unread(
    session: &mut ImapSession,
    config: &ImapConfig,
    sender_filter: &str,
) -> Result<Vec<Envelope>, SourceError> {
    session
        .select(&config.folder)
        .map_err(|source| SourceError::Folder {
            folder: config.folder.clone(),
            source,
        })?;
    tracing::debug!(folder = %config.folder, "mailbox selected");

    let criterion = format!("UNSEEN FROM {}", quote_search_value(sender_filter));
    let mut uids: Vec<u32> = session
        .uid_search(&criterion)
        .map_err(SourceError::Search)?
        .into_iter()
        .collect();
    // UID SEARCH returns an unordered set; process oldest-first.
    uids.sort_unstable();

    if uids.is_empty() {
        tracing::info!("no new mail");
        return Ok(Vec::new());
    }
    tracing::info!(count = uids.len(), "found unread messages, processing");

    let mut envelopes = Vec::new();

    for uid in uids {
        let fetches = match session.uid_fetch(uid.to_string(), "RFC822") {
            Ok(fetches) => fetches,
            Err(error) => {
                // Left unseen: a transient fetch failure retries next cycle.
                tracing::warn!(uid, %error, "failed to fetch message, skipping");
                continue;
            }
        };

        for fetch in fetches.iter() {
            match fetch.body() {
                Some(raw) => match build_envelope(raw, sender_filter) {
                    Ok(Some(envelope)) => envelopes.push(envelope),
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(uid, %error, "failed to parse message, skipping");
                    }
                },
                None => tracing::warn!(uid, "fetch returned no body, skipping"),
            }
        }

        mark_seen(session, uid);
    }

    Ok(envelopes)
}

/// Flag a message `\Seen` so no future search offers it again.
fn mark_seen(session: &mut ImapSession, uid: u32) {
    if let Err(error) = session.uid_store(uid.to_string(), "+FLAGS (\\Seen)") {
        tracing::warn!(uid, %error, "failed to mark message as seen");
    }
}

/// Parse raw message bytes and apply the exact-sender post-filter.
///
/// Returns `Ok(None)` for messages that should be dropped without being
/// relayed (sender mismatch, unparseable From header).
fn build_envelope(raw: &[u8], sender_filter: &str) -> anyhow::Result<Option<Envelope>> {
    let parsed = mailparse::parse_mail(raw).context("failed to parse MIME message")?;
    let headers = parsed.headers.as_slice();

    let from_header = headers.get_first_value("From").unwrap_or_default();
    let Some(sender) = parse_sender_address(&from_header) else {
        tracing::info!(from = %from_header, "skipping message without a parseable sender");
        return Ok(None);
    };

    if !sender_matches(&sender, sender_filter) {
        tracing::info!(
            sender = %sender,
            expected = %sender_filter,
            "skipping message from non-watched sender"
        );
        return Ok(None);
    }

    let subject = headers.get_first_value("Subject");
    let date = headers.get_first_value("Date");
    let to = headers.get_first_value("To");

    tracing::debug!(
        sender = %sender,
        subject = subject.as_deref().unwrap_or("(no subject)"),
        "relaying message"
    );

    let body = extract::extract_markdown(&parsed);

    Ok(Some(Envelope {
        sender,
        subject,
        date,
        to,
        body,
    }))
}

/// Reduce a From header to the addr-spec of its first mailbox, discarding
/// display names and comments.
fn parse_sender_address(value: &str) -> Option<String> {
    let addresses = mailparse::addrparse(value).ok()?.into_inner();
    for address in addresses {
        match address {
            MailAddr::Single(single) => return Some(single.addr),
            MailAddr::Group(group) => {
                if let Some(single) = group.addrs.into_iter().next() {
                    return Some(single.addr);
                }
            }
        }
    }
    None
}

/// Exact address comparison. The IMAP search already narrowed to substring
/// matches; this rejects the false positives.
fn sender_matches(actual: &str, expected: &str) -> bool {
    actual.trim().eq_ignore_ascii_case(expected.trim())
}

fn quote_search_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
