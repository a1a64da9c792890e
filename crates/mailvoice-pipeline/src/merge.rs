//! The join: merge-fields node and the aggregator
//!
//! This is the graph's fan-in. Each branch returns a [`Contribution`] by
//! value; the pipeline collects them in fixed branch-declaration order and
//! folds them here. Because the fold order never depends on completion
//! order, the report is the same however the scheduler interleaved the
//! branches.

use mailvoice_domain::{ExtractionReport, FieldSet, PartialResult, SourceRecord};

/// Source key for results extracted from the email text itself
pub const MAIL_SOURCE: &str = "Mail";

/// One branch's output at the join
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contribution {
    /// Partial results this branch produced
    pub partials: Vec<PartialResult>,
    /// Token subtotal for the branch's adapter calls
    pub tokens: u64,
}

impl Contribution {
    /// A branch that was not scheduled contributes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap partial results, taking the token subtotal from the costs the
    /// adapter reported per page.
    pub fn from_partials(partials: Vec<PartialResult>) -> Self {
        let tokens = partials.iter().map(|p| p.tokens).sum();
        Self { partials, tokens }
    }
}

/// Join the two text branches' field sets into the "Mail" partial.
///
/// `missing_fields` is the fixed field list minus the keys the branches
/// actually returned. Runs only after both text branches completed; a text
/// branch failure never reaches this node.
pub fn merge_fields(names: FieldSet, invoice: FieldSet) -> PartialResult {
    let mut fields = names;
    fields.merge(&invoice);

    let mut partial = PartialResult::new(MAIL_SOURCE, 1);
    partial.missing_fields = fields.missing_fields();
    partial.fields = fields;
    partial
}

/// Fold every contribution into one report.
///
/// Groups partials by source (first-seen order), merging fields
/// last-write-wins in fold order and concatenating missing-field and error
/// lists without deduplication. The deterministic tie-break for conflicting
/// field values is the contribution order the pipeline passes in: a branch
/// declared later overrides one declared earlier. The token total is the
/// sum of every contribution's subtotal.
pub fn aggregate(contributions: &[Contribution]) -> ExtractionReport {
    let mut records: Vec<SourceRecord> = Vec::new();
    let mut tokens = 0u64;

    for contribution in contributions {
        tokens += contribution.tokens;
        for partial in &contribution.partials {
            let idx = match records.iter().position(|r| r.source == partial.source) {
                Some(idx) => idx,
                None => {
                    records.push(SourceRecord::new(&partial.source));
                    records.len() - 1
                }
            };
            let record = &mut records[idx];
            record.fields.merge(&partial.fields);
            record
                .missing_fields
                .extend(partial.missing_fields.iter().copied());
            if let Some(error) = &partial.error {
                if !error.is_empty() {
                    record.errors.push(error.clone());
                }
            }
        }
    }

    ExtractionReport {
        extractions: records,
        tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailvoice_domain::Field;

    fn fieldset(pairs: &[(Field, &str)]) -> FieldSet {
        pairs
            .iter()
            .map(|(f, v)| (*f, v.to_string()))
            .collect()
    }

    fn partial(source: &str, page: u32, fields: FieldSet) -> PartialResult {
        let mut partial = PartialResult::new(source, page);
        partial.missing_fields = fields.missing_fields();
        partial.fields = fields;
        partial
    }

    #[test]
    fn test_merge_fields_unions_both_branches() {
        let names = fieldset(&[
            (Field::CustomerName, "Acme SA"),
            (Field::CustomerTaxId, "30-1"),
        ]);
        let invoice = fieldset(&[(Field::InvoiceId, "A-1")]);

        let merged = merge_fields(names, invoice);
        assert_eq!(merged.source, MAIL_SOURCE);
        assert_eq!(merged.page_number, 1);
        assert!(merged.error.is_none());
        assert_eq!(merged.fields.get(Field::CustomerName), Some("Acme SA"));
        assert_eq!(merged.fields.get(Field::InvoiceId), Some("A-1"));
        // Exactly the fixed list minus what the branches returned.
        assert_eq!(
            merged.missing_fields,
            vec![
                Field::VendorTaxId,
                Field::PurchaseOrderNumber,
                Field::InvoiceDate,
                Field::InvoiceTotal,
            ]
        );
    }

    #[test]
    fn test_merge_fields_missing_is_exact_complement() {
        let names = fieldset(&[(Field::CustomerName, "Acme SA")]);
        let invoice = fieldset(&[(Field::InvoiceId, "A-1")]);

        let merged = merge_fields(names, invoice);
        assert_eq!(
            merged.missing_fields,
            vec![
                Field::CustomerTaxId,
                Field::VendorTaxId,
                Field::PurchaseOrderNumber,
                Field::InvoiceDate,
                Field::InvoiceTotal,
            ]
        );
    }

    #[test]
    fn test_aggregate_groups_by_source_across_contributions() {
        let mail = Contribution::from_partials(vec![partial(
            MAIL_SOURCE,
            1,
            fieldset(&[(Field::CustomerName, "Acme SA")]),
        )]);
        let vision = Contribution::from_partials(vec![
            partial("doc.pdf", 1, fieldset(&[(Field::InvoiceId, "A-1")])),
            partial("doc.pdf", 2, fieldset(&[(Field::InvoiceTotal, "500")])),
        ]);

        let report = aggregate(&[mail, vision]);
        assert_eq!(report.extractions.len(), 2);
        assert_eq!(report.extractions[0].source, MAIL_SOURCE);
        assert_eq!(report.extractions[1].source, "doc.pdf");
        // Pages of the same document merge into one record.
        assert_eq!(
            report.extractions[1].fields.get(Field::InvoiceId),
            Some("A-1")
        );
        assert_eq!(
            report.extractions[1].fields.get(Field::InvoiceTotal),
            Some("500")
        );
    }

    #[test]
    fn test_aggregate_later_contribution_wins_conflicts() {
        let first = Contribution::from_partials(vec![partial(
            "doc.pdf",
            1,
            fieldset(&[(Field::InvoiceTotal, "100")]),
        )]);
        let second = Contribution::from_partials(vec![partial(
            "doc.pdf",
            1,
            fieldset(&[(Field::InvoiceTotal, "999")]),
        )]);

        let report = aggregate(&[first, second]);
        assert_eq!(
            report.extractions[0].fields.get(Field::InvoiceTotal),
            Some("999")
        );
    }

    #[test]
    fn test_aggregate_concatenates_missing_fields_without_dedup() {
        let a = Contribution::from_partials(vec![partial("doc.pdf", 1, FieldSet::new())]);
        let b = Contribution::from_partials(vec![partial("doc.pdf", 2, FieldSet::new())]);

        let report = aggregate(&[a, b]);
        // Both pages were missing everything; duplicates preserved.
        assert_eq!(
            report.extractions[0].missing_fields.len(),
            Field::ALL.len() * 2
        );
    }

    #[test]
    fn test_aggregate_collects_nonempty_errors_only() {
        let mut with_error = partial("scan.png", 1, FieldSet::new());
        with_error.error = Some("unreadable".to_string());
        let mut with_empty = partial("scan.png", 2, FieldSet::new());
        with_empty.error = Some(String::new());

        let report = aggregate(&[Contribution::from_partials(vec![with_error, with_empty])]);
        assert_eq!(report.extractions[0].errors, vec!["unreadable"]);
    }

    #[test]
    fn test_aggregate_sums_contribution_tokens() {
        let mut p1 = partial("a.png", 1, FieldSet::new());
        p1.tokens = 120;
        let mut p2 = partial("b.png", 1, FieldSet::new());
        p2.tokens = 80;

        let vision = Contribution::from_partials(vec![p1, p2]);
        assert_eq!(vision.tokens, 200);

        let report = aggregate(&[Contribution::empty(), vision]);
        assert_eq!(report.tokens, 200);
    }

    #[test]
    fn test_aggregate_empty_contributions_is_empty_report() {
        let report = aggregate(&[Contribution::empty(), Contribution::empty()]);
        assert!(report.extractions.is_empty());
        assert_eq!(report.tokens, 0);
    }
}
