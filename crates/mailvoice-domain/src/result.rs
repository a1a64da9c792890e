//! Partial results emitted by branches and the consolidated report

use crate::field::{Field, FieldSet};
use serde::{Deserialize, Serialize};

/// One branch's contribution for a single source (and page, for documents).
///
/// Several partials may share a `source` (the vision pass emits one per PDF
/// page under the PDF's file name); the aggregator merges them back into
/// a single [`SourceRecord`]. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
    /// Grouping key: `"Mail"` or an attachment's file name
    pub source: String,
    /// 1-based page number within the source document
    pub page_number: u32,
    /// Fields this branch extracted for this source/page
    pub fields: FieldSet,
    /// Required fields the branch could not extract
    pub missing_fields: Vec<Field>,
    /// Branch-level soft error for this source/page, if any
    pub error: Option<String>,
    /// Token cost the adapter reported for this page; zero when the adapter
    /// does no cost accounting
    pub tokens: u64,
}

impl PartialResult {
    /// Create an empty partial for a source/page, to be filled in by the
    /// extracting branch.
    pub fn new(source: impl Into<String>, page_number: u32) -> Self {
        Self {
            source: source.into(),
            page_number,
            fields: FieldSet::new(),
            missing_fields: Vec::new(),
            error: None,
            tokens: 0,
        }
    }
}

/// The merged record for one source after aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Grouping key: `"Mail"` or an attachment's file name
    pub source: String,
    /// Union of every partial's fields for this source
    pub fields: FieldSet,
    /// Concatenated missing-field lists, duplicates preserved
    pub missing_fields: Vec<Field>,
    /// Concatenated non-empty branch errors, duplicates preserved
    pub errors: Vec<String>,
}

impl SourceRecord {
    /// Create an empty record for a source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: FieldSet::new(),
            missing_fields: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// The terminal output of one graph run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// One record per distinct source, first-seen order
    pub extractions: Vec<SourceRecord>,
    /// Total token cost across every cost-reporting adapter call
    pub tokens: u64,
}

impl ExtractionReport {
    /// Walk the report and collect each record's missing-field list, keyed
    /// by source. Debug/reporting helper; the lists keep their duplicates.
    pub fn missing_fields(&self) -> Vec<(&str, &[Field])> {
        self.extractions
            .iter()
            .map(|record| (record.source.as_str(), record.missing_fields.as_slice()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_result_new_is_empty() {
        let partial = PartialResult::new("invoice.pdf", 3);
        assert_eq!(partial.source, "invoice.pdf");
        assert_eq!(partial.page_number, 3);
        assert!(partial.fields.is_empty());
        assert!(partial.missing_fields.is_empty());
        assert!(partial.error.is_none());
        assert_eq!(partial.tokens, 0);
    }

    #[test]
    fn test_report_missing_fields_visitor() {
        let mut mail = SourceRecord::new("Mail");
        mail.missing_fields = vec![Field::InvoiceDate, Field::InvoiceTotal];
        let mut scan = SourceRecord::new("scan.png");
        scan.missing_fields = vec![Field::CustomerName, Field::CustomerName];

        let report = ExtractionReport {
            extractions: vec![mail, scan],
            tokens: 0,
        };

        let missing = report.missing_fields();
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].0, "Mail");
        assert_eq!(missing[0].1, &[Field::InvoiceDate, Field::InvoiceTotal]);
        // Duplicates are preserved, not collapsed.
        assert_eq!(missing[1].1, &[Field::CustomerName, Field::CustomerName]);
    }

    #[test]
    fn test_report_serializes_with_extractions_and_tokens() {
        let report = ExtractionReport {
            extractions: vec![SourceRecord::new("Mail")],
            tokens: 42,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["tokens"], 42);
        assert_eq!(json["extractions"][0]["source"], "Mail");
        assert!(json["extractions"][0]["errors"].as_array().unwrap().is_empty());
    }
}
