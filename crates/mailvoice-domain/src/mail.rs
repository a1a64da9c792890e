//! Inbound mail request and the classified state derived from it

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named binary attachment from the inbound email.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name as received, extension included
    pub file_name: String,
    /// Raw file bytes
    pub content: Vec<u8>,
}

impl Attachment {
    /// Create an attachment from a name and raw bytes.
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Content can be megabytes; log the length only.
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_len", &self.content.len())
            .finish()
    }
}

/// One extraction request: an email's subject, body, and attachments.
///
/// Immutable once built; the classifier derives [`ClassifiedMail`] from it
/// without mutating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailRequest {
    /// Email subject line
    pub subject: String,
    /// Email body text
    pub body: String,
    /// All attachments, any type
    pub attachments: Vec<Attachment>,
}

/// The classifier's output: request state partitioned for the graph.
///
/// `images` and `pdfs` are disjoint and together cover every attachment whose
/// extension matched; attachments matching neither bucket are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedMail {
    /// Subject and body concatenated, no separator
    pub text: String,
    /// Attachments with an image extension
    pub images: Vec<Attachment>,
    /// Attachments with a .pdf extension
    pub pdfs: Vec<Attachment>,
    /// Running token-cost counter, starts at zero
    pub tokens: u64,
}
