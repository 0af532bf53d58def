//! Webhook publisher: signed URL construction and markdown delivery.
//!
//! When a signing secret is configured, the delivery URL carries two extra
//! query parameters: `timestamp` (unix epoch milliseconds) and `sign`, the
//! URL-encoded base64 HMAC-SHA256 of `"{timestamp}\n{secret}"` keyed by
//! the secret. Without a secret the base URL is used verbatim.
//!
//! Delivery outcomes are logged, never raised: by the time a message gets
//! here it is already flagged seen on the server, so a failed push is
//! permanently lost and retrying would not be safe from this layer.

use std::time::Duration;

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::WebhookConfig;
use crate::notify::format::Notification;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type HmacSha256 = Hmac<Sha256>;

/// Outgoing payload shape expected by the chat robot.
#[derive(Debug, Serialize)]
struct MarkdownPayload<'a> {
    msgtype: &'static str,
    markdown: MarkdownBody<'a>,
}

#[derive(Debug, Serialize)]
struct MarkdownBody<'a> {
    title: &'a str,
    text: &'a str,
}

/// Reply body the robot endpoint returns on HTTP 200.
#[derive(Debug, Deserialize)]
struct WebhookReply {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Webhook publisher state: one HTTP client for the process lifetime.
pub struct WebhookPublisher {
    client: reqwest::Client,
    base_url: String,
    secret: String,
}

impl WebhookPublisher {
    pub fn new(config: &WebhookConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build webhook HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            secret: config.secret.clone(),
        })
    }

    /// Deliver one notification. Success and failure are both logged here;
    /// nothing is returned because the caller has no recovery path.
    pub async fn publish(&self, notification: &Notification) {
        match self.try_publish(notification).await {
            Ok(()) => tracing::info!(title = %notification.title, "notification delivered"),
            Err(error) => {
                tracing::error!(%error, title = %notification.title, "notification delivery failed");
            }
        }
    }

    async fn try_publish(&self, notification: &Notification) -> anyhow::Result<()> {
        let url = self.delivery_url(chrono::Utc::now().timestamp_millis());
        let payload = MarkdownPayload {
            msgtype: "markdown",
            markdown: MarkdownBody {
                title: &notification.title,
                text: &notification.text,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("webhook request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read webhook response body")?;

        interpret_reply(status.as_u16(), &body)
    }

    /// The URL one POST goes to, signed when a secret is configured.
    fn delivery_url(&self, timestamp_ms: i64) -> String {
        if self.secret.is_empty() {
            return self.base_url.clone();
        }

        let sign = quote_plus(&sign(&self.secret, timestamp_ms));
        format!("{}&timestamp={timestamp_ms}&sign={sign}", self.base_url)
    }
}

/// Base64 HMAC-SHA256 of `"{timestamp}\n{secret}"` keyed by the secret.
fn sign(secret: &str, timestamp_ms: i64) -> String {
    let string_to_sign = format!("{timestamp_ms}\n{secret}");
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Percent-encode with quote-plus semantics: space becomes `+`, everything
/// else non-alphanumeric becomes `%XX`.
fn quote_plus(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Decide success or failure from the HTTP status and raw reply body.
fn interpret_reply(status: u16, body: &str) -> anyhow::Result<()> {
    if status != 200 {
        anyhow::bail!("webhook returned HTTP {status}: {body}");
    }

    let reply: WebhookReply = serde_json::from_str(body)
        .with_context(|| format!("webhook returned unrecognized reply: {body}"))?;

    if reply.errcode != 0 {
        anyhow::bail!(
            "webhook rejected message: errcode={} errmsg={}",
            reply.errcode,
            reply.errmsg
        );
    }

    Ok(())
}
