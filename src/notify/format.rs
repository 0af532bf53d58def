//! Notification formatting: title and metadata block.

use crate::mail::Envelope;

/// What gets published: a title for the chat card and the full markdown
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub text: String,
}

/// Assemble the notification for one message.
///
/// The text leads with a three-line metadata block (sender, date,
/// recipient), a blank line, then the extracted body. Each metadata line
/// ends in two spaces so markdown renderers keep the hard break.
pub fn render(envelope: &Envelope) -> Notification {
    let title = match envelope.subject.as_deref().map(str::trim) {
        Some(subject) if !subject.is_empty() => subject.to_string(),
        _ => "(no subject)".to_string(),
    };

    let date = envelope.date.as_deref().unwrap_or("unknown");
    let to = envelope.to.as_deref().unwrap_or("unknown");

    let text = format!(
        "**From**: {}  \n**Date**: {}  \n**To**: {}  \n\n{}",
        envelope.sender, date, to, envelope.body
    );

    Notification { title, text }
}
