//! Body extraction: pick the richest part and convert it to markdown.
//!
//! Part priority: the first non-attachment `text/html` part wins outright;
//! otherwise the first non-attachment `text/plain` part; otherwise a fixed
//! placeholder. The walk is depth-first in document order, so "first"
//! means first as the message lays its parts out. A single-part message is
//! the degenerate one-leaf case of the same walk.

use mailparse::{DispositionType, ParsedMail};

/// Returned when a message has no usable text part at all.
pub const NO_CONTENT_PLACEHOLDER: &str = "(no content)";

/// Extract a markdown rendering of the message body. Never empty and never
/// an error: extraction falls back to a placeholder rather than failing.
pub fn extract_markdown(mail: &ParsedMail<'_>) -> String {
    let mut html = None;
    let mut plain = None;
    scan_parts(mail, &mut html, &mut plain);

    if let Some(html) = html {
        let markdown = html2md::parse_html(&html).trim().to_string();
        if !markdown.is_empty() {
            return markdown;
        }
    }

    if let Some(plain) = plain {
        return plain.trim().to_string();
    }

    NO_CONTENT_PLACEHOLDER.to_string()
}

/// Walk leaf parts in document order, recording the first qualifying HTML
/// and plain-text bodies. Stops as soon as an HTML part is found.
fn scan_parts(part: &ParsedMail<'_>, html: &mut Option<String>, plain: &mut Option<String>) {
    if html.is_some() {
        return;
    }

    if part.subparts.is_empty() {
        let disposition = part.get_content_disposition();
        if matches!(disposition.disposition, DispositionType::Attachment) {
            return;
        }

        let mime_type = part.ctype.mimetype.to_ascii_lowercase();
        if mime_type.starts_with("text/html") {
            if let Ok(body) = part.get_body()
                && !body.trim().is_empty()
            {
                *html = Some(body);
            }
        } else if mime_type.starts_with("text/plain")
            && plain.is_none()
            && let Ok(body) = part.get_body()
            && !body.trim().is_empty()
        {
            *plain = Some(body);
        }
        return;
    }

    for subpart in &part.subparts {
        scan_parts(subpart, html, plain);
    }
}

#[cfg(test)]
mod tests {
    use super::{NO_CONTENT_PLACEHOLDER, extract_markdown};
    use indoc::indoc;

    fn extract(raw: &str) -> String {
        let parsed = mailparse::parse_mail(raw.as_bytes()).expect("fixture parses");
        extract_markdown(&parsed)
    }

    #[test]
    fn html_part_beats_earlier_plain_part() {
        let raw = indoc! {r#"
            From: a@example.com
            Subject: alternative
            Content-Type: multipart/alternative; boundary="sep"

            --sep
            Content-Type: text/plain; charset=utf-8

            plain rendering
            --sep
            Content-Type: text/html; charset=utf-8

            <p>html rendering</p>
            --sep--
        "#};

        let markdown = extract(raw);
        assert!(markdown.contains("html rendering"));
        assert!(!markdown.contains("plain rendering"));
    }

    #[test]
    fn links_and_images_survive_conversion() {
        let raw = indoc! {r#"
            From: a@example.com
            Subject: report
            Content-Type: text/html; charset=utf-8

            <p>See the <a href="https://status.example.com/incident/42">incident page</a>
            for details.</p>
            <img src="https://status.example.com/graph.png" alt="error rate" />
        "#};

        let markdown = extract(raw);
        assert!(markdown.contains("https://status.example.com/incident/42"));
        assert!(markdown.contains("incident page"));
        assert!(markdown.contains("https://status.example.com/graph.png"));
        assert!(markdown.contains("!["));
    }

    #[test]
    fn long_paragraphs_are_not_hard_wrapped() {
        let sentence = "the quick brown fox jumps over the lazy dog and keeps \
                        running far beyond any fixed console width because nothing \
                        should ever wrap this paragraph in the middle";
        let raw = format!(
            "From: a@example.com\n\
             Subject: wide\n\
             Content-Type: text/html; charset=utf-8\n\
             \n\
             <p>{sentence}</p>\n"
        );

        let parsed = mailparse::parse_mail(raw.as_bytes()).expect("fixture parses");
        let markdown = extract_markdown(&parsed);
        assert!(markdown.lines().any(|line| line.contains("beyond any fixed console width")));
    }

    #[test]
    fn plain_part_is_used_when_no_html_exists() {
        let raw = indoc! {"
            From: a@example.com
            Subject: plain only
            Content-Type: text/plain; charset=utf-8

            just plain text
        "};

        assert_eq!(extract(raw), "just plain text");
    }

    #[test]
    fn attachment_parts_are_skipped() {
        let raw = indoc! {r#"
            From: a@example.com
            Subject: with attachment
            Content-Type: multipart/mixed; boundary="sep"

            --sep
            Content-Type: text/html; charset=utf-8
            Content-Disposition: attachment; filename="report.html"

            <p>attached report</p>
            --sep
            Content-Type: text/plain; charset=utf-8

            see attached
            --sep--
        "#};

        assert_eq!(extract(raw), "see attached");
    }

    #[test]
    fn attachment_only_message_yields_placeholder() {
        let raw = indoc! {r#"
            From: a@example.com
            Subject: only attachment
            Content-Type: multipart/mixed; boundary="sep"

            --sep
            Content-Type: application/pdf
            Content-Disposition: attachment; filename="invoice.pdf"
            Content-Transfer-Encoding: base64

            JVBERi0xLjQ=
            --sep--
        "#};

        assert_eq!(extract(raw), NO_CONTENT_PLACEHOLDER);
    }

    #[test]
    fn undecodable_bytes_do_not_fail_extraction() {
        // Declared UTF-8 but carrying an invalid sequence; decoding is lossy.
        let mut raw = indoc! {"
            From: a@example.com
            Subject: mojibake
            Content-Type: text/plain; charset=utf-8

            before "}
        .as_bytes()
        .to_vec();
        raw.extend_from_slice(&[0xFF, 0xFE]);
        raw.extend_from_slice(b" after\n");

        let parsed = mailparse::parse_mail(&raw).expect("fixture parses");
        let markdown = extract_markdown(&parsed);
        assert!(markdown.starts_with("before"));
        assert!(markdown.ends_with("after"));
    }
}
