//! Inbound wire format
//!
//! The HTTP body uses the upstream mail system's field names (`asunto`,
//! `cuerpo`, `adjuntos`) with attachments inlined as base64. This module
//! converts that envelope into a [`MailRequest`], keeping `adjuntos` as a
//! raw JSON value long enough to report "not a list" precisely.

use base64::Engine;
use mailvoice_domain::{Attachment, MailRequest};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The inbound request envelope
#[derive(Debug, Deserialize)]
pub struct WireRequest {
    /// Email subject
    pub asunto: String,
    /// Email body
    pub cuerpo: String,
    /// Attachment list, validated in [`decode_request`]
    pub adjuntos: Value,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    file_name: String,
    base64_content: String,
}

/// Errors rejecting a malformed envelope
#[derive(Debug, Error)]
pub enum WireError {
    /// `adjuntos` was not a JSON array
    #[error("adjuntos must be a list of attachments")]
    AttachmentsNotAList,

    /// An attachment entry did not have the expected shape
    #[error("invalid attachment at index {0}: {1}")]
    InvalidAttachment(usize, String),

    /// An attachment's content was not valid base64
    #[error("invalid base64 content in '{0}': {1}")]
    InvalidBase64(String, String),
}

/// Convert the wire envelope into a domain request.
pub fn decode_request(wire: WireRequest) -> Result<MailRequest, WireError> {
    let entries = match wire.adjuntos {
        Value::Array(entries) => entries,
        _ => return Err(WireError::AttachmentsNotAList),
    };

    let mut attachments = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let wire_attachment: WireAttachment = serde_json::from_value(entry)
            .map_err(|e| WireError::InvalidAttachment(idx, e.to_string()))?;
        let content = base64::engine::general_purpose::STANDARD
            .decode(&wire_attachment.base64_content)
            .map_err(|e| {
                WireError::InvalidBase64(wire_attachment.file_name.clone(), e.to_string())
            })?;
        attachments.push(Attachment::new(wire_attachment.file_name, content));
    }

    Ok(MailRequest {
        subject: wire.asunto,
        body: wire.cuerpo,
        attachments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(adjuntos: Value) -> WireRequest {
        WireRequest {
            asunto: "Invoice #123".to_string(),
            cuerpo: "Total due 500".to_string(),
            adjuntos,
        }
    }

    #[test]
    fn test_decode_without_attachments() {
        let request = decode_request(wire(json!([]))).unwrap();
        assert_eq!(request.subject, "Invoice #123");
        assert_eq!(request.body, "Total due 500");
        assert!(request.attachments.is_empty());
    }

    #[test]
    fn test_decode_base64_attachment() {
        let request = decode_request(wire(json!([
            { "file_name": "scan.png", "base64_content": "aGVsbG8=" }
        ])))
        .unwrap();
        assert_eq!(request.attachments.len(), 1);
        assert_eq!(request.attachments[0].file_name, "scan.png");
        assert_eq!(request.attachments[0].content, b"hello");
    }

    #[test]
    fn test_adjuntos_not_a_list_is_rejected() {
        let result = decode_request(wire(json!("scan.png")));
        assert!(matches!(result, Err(WireError::AttachmentsNotAList)));

        let result = decode_request(wire(json!(null)));
        assert!(matches!(result, Err(WireError::AttachmentsNotAList)));
    }

    #[test]
    fn test_malformed_attachment_entry_is_rejected() {
        let result = decode_request(wire(json!([{ "file_name": "scan.png" }])));
        match result {
            Err(WireError::InvalidAttachment(idx, _)) => assert_eq!(idx, 0),
            other => panic!("expected InvalidAttachment, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_base64_is_rejected() {
        let result = decode_request(wire(json!([
            { "file_name": "scan.png", "base64_content": "not base64!!!" }
        ])));
        match result {
            Err(WireError::InvalidBase64(name, _)) => assert_eq!(name, "scan.png"),
            other => panic!("expected InvalidBase64, got {:?}", other),
        }
    }
}
