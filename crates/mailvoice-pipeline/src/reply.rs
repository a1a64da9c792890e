//! Decode model replies for the text branches
//!
//! Models wrap their answers in markdown fences, lead with prose, or append
//! caveats. Rather than stripping known delimiters, this module scans for
//! the first balanced top-level JSON object and parses that, so any reply
//! containing one well-formed object decodes.

use crate::error::PipelineError;
use mailvoice_domain::{Field, FieldSet};
use serde_json::Value;

/// Extract the first balanced JSON object from a free-text reply.
///
/// The scan is string- and escape-aware, so braces inside string literals
/// do not unbalance it.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let bytes = reply.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&reply[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a text-branch reply into the expected fields.
///
/// Every expected key must be present in the object (by its external model
/// name); a present-but-null value counts as present with an empty value.
pub fn parse_reply_fields(
    reply: &str,
    branch: &'static str,
    expected: &[Field],
) -> Result<FieldSet, PipelineError> {
    let object = extract_json_object(reply).ok_or_else(|| PipelineError::InvalidReply {
        branch,
        message: "no JSON object in reply".to_string(),
    })?;

    let json: Value =
        serde_json::from_str(object).map_err(|e| PipelineError::InvalidReply {
            branch,
            message: format!("reply is not valid JSON: {}", e),
        })?;
    let obj = json.as_object().ok_or_else(|| PipelineError::InvalidReply {
        branch,
        message: "reply is not a JSON object".to_string(),
    })?;

    let mut fields = FieldSet::new();
    for field in expected {
        let value = obj
            .get(field.model_key())
            .ok_or(PipelineError::MissingKey {
                branch,
                key: field.model_key(),
            })?;
        match value {
            Value::String(s) => fields.insert(*field, s.clone()),
            Value::Null => fields.insert(*field, ""),
            other => fields.insert(*field, other.to_string()),
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRANCH: &str = "test-branch";

    #[test]
    fn test_extract_plain_object() {
        let reply = r#"{"InvoiceId": "A-1"}"#;
        assert_eq!(extract_json_object(reply), Some(reply));
    }

    #[test]
    fn test_extract_from_markdown_fence() {
        let reply = "```json\n{\"InvoiceId\": \"A-1\"}\n```";
        assert_eq!(extract_json_object(reply), Some(r#"{"InvoiceId": "A-1"}"#));
    }

    #[test]
    fn test_extract_with_prose_around() {
        let reply = "Sure! Here is the data:\n{\"InvoiceId\": \"A-1\"}\nLet me know if you need more.";
        assert_eq!(extract_json_object(reply), Some(r#"{"InvoiceId": "A-1"}"#));
    }

    #[test]
    fn test_extract_handles_braces_in_strings() {
        let reply = r#"{"CustomerName": "Acme {Holdings}", "InvoiceId": "A-1"}"#;
        assert_eq!(extract_json_object(reply), Some(reply));
    }

    #[test]
    fn test_extract_handles_escaped_quotes() {
        let reply = r#"{"CustomerName": "Acme \"The Best\" SA"}"#;
        assert_eq!(extract_json_object(reply), Some(reply));
    }

    #[test]
    fn test_extract_nested_object() {
        let reply = r#"prefix {"a": {"b": 1}} suffix"#;
        assert_eq!(extract_json_object(reply), Some(r#"{"a": {"b": 1}}"#));
    }

    #[test]
    fn test_extract_none_without_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("unbalanced { forever"), None);
    }

    #[test]
    fn test_parse_expected_fields() {
        let reply = r#"{"CustomerName": "Acme SA", "CustomerTaxId": "30-1", "VendorTaxId": "30-2"}"#;
        let fields = parse_reply_fields(
            reply,
            BRANCH,
            &[Field::CustomerName, Field::CustomerTaxId, Field::VendorTaxId],
        )
        .unwrap();
        assert_eq!(fields.get(Field::CustomerName), Some("Acme SA"));
        assert_eq!(fields.get(Field::CustomerTaxId), Some("30-1"));
        assert_eq!(fields.get(Field::VendorTaxId), Some("30-2"));
    }

    #[test]
    fn test_parse_null_counts_as_present_and_empty() {
        let reply = r#"{"InvoiceId": null, "InvoiceDate": "2025-01-01", "InvoiceTotal": "500"}"#;
        let fields = parse_reply_fields(
            reply,
            BRANCH,
            &[Field::InvoiceId, Field::InvoiceDate, Field::InvoiceTotal],
        )
        .unwrap();
        assert_eq!(fields.get(Field::InvoiceId), Some(""));
        assert_eq!(fields.get(Field::InvoiceTotal), Some("500"));
    }

    #[test]
    fn test_parse_missing_key_is_an_error() {
        let reply = r#"{"CustomerName": "Acme SA"}"#;
        let result =
            parse_reply_fields(reply, BRANCH, &[Field::CustomerName, Field::CustomerTaxId]);
        match result {
            Err(PipelineError::MissingKey { branch, key }) => {
                assert_eq!(branch, BRANCH);
                assert_eq!(key, "CustomerTaxId");
            }
            other => panic!("expected MissingKey, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_non_json_is_an_error() {
        let result = parse_reply_fields("I cannot help with that", BRANCH, &[Field::InvoiceId]);
        assert!(matches!(result, Err(PipelineError::InvalidReply { .. })));
    }

    #[test]
    fn test_parse_numeric_value_is_stringified() {
        let reply = r#"{"InvoiceTotal": 500.5}"#;
        let fields = parse_reply_fields(reply, BRANCH, &[Field::InvoiceTotal]).unwrap();
        assert_eq!(fields.get(Field::InvoiceTotal), Some("500.5"));
    }
}
