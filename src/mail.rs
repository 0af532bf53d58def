//! Mailbox access: IMAP source adapter and MIME body extraction.

pub mod extract;
pub mod source;

pub use source::Envelope;
