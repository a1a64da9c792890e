//! Attachment classification
//!
//! First node of the graph: partition the request's attachments into image
//! and PDF buckets by file extension and flatten subject + body into the
//! text the free-text branches read.

use mailvoice_domain::{ClassifiedMail, MailRequest};

/// Extensions routed to the image bucket
pub const IMAGE_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"];

/// Extension routed to the PDF bucket
pub const PDF_EXTENSION: &str = ".pdf";

/// Partition a request into classified state.
///
/// Matching is case-insensitive on the file-name suffix. Attachments that
/// match neither bucket are dropped without error. Subject and body are
/// concatenated with no separator; the token counter starts at zero.
pub fn classify(request: &MailRequest) -> ClassifiedMail {
    let mut images = Vec::new();
    let mut pdfs = Vec::new();

    for attachment in &request.attachments {
        let name = attachment.file_name.to_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            images.push(attachment.clone());
        } else if name.ends_with(PDF_EXTENSION) {
            pdfs.push(attachment.clone());
        }
    }

    ClassifiedMail {
        text: format!("{}{}", request.subject, request.body),
        images,
        pdfs,
        tokens: 0,
    }
}
