//! Instruction templates for the text branches

/// Names/tax-ids branch instructions
const NAMES_AND_TAX_IDS_INSTRUCTIONS: &str = r#"You are given the text of an email about an invoice.
Extract the customer's legal name and the tax identifiers (CUIT or equivalent) of customer and vendor.

Answer with exactly this JSON object:

{
  "CustomerName": "...",
  "CustomerTaxId": "...",
  "VendorTaxId": "..."
}

Rules:
- Every key must be present; use null when the text does not state a value
- Copy values verbatim from the text, do not normalize or invent them
- Return ONLY the JSON object, no markdown code blocks, no explanations"#;

/// Invoice-fields branch instructions
const INVOICE_FIELDS_INSTRUCTIONS: &str = r#"You are given the text of an email about an invoice.
Extract the invoice number, the issue date, and the total amount due.

Answer with exactly this JSON object:

{
  "InvoiceId": "...",
  "InvoiceDate": "...",
  "InvoiceTotal": "..."
}

Rules:
- Every key must be present; use null when the text does not state a value
- Copy values verbatim from the text, do not normalize or invent them
- Return ONLY the JSON object, no markdown code blocks, no explanations"#;

/// Build the names/tax-ids extraction prompt for an email's text.
pub fn names_and_tax_ids_prompt(text: &str) -> String {
    format!(
        "{}\n\nEmail text:\n---\n{}\n---",
        NAMES_AND_TAX_IDS_INSTRUCTIONS, text
    )
}

/// Build the invoice-fields extraction prompt for an email's text.
pub fn invoice_fields_prompt(text: &str) -> String {
    format!(
        "{}\n\nEmail text:\n---\n{}\n---",
        INVOICE_FIELDS_INSTRUCTIONS, text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_prompt_includes_keys_and_text() {
        let prompt = names_and_tax_ids_prompt("Invoice from Acme SA");
        assert!(prompt.contains("CustomerName"));
        assert!(prompt.contains("CustomerTaxId"));
        assert!(prompt.contains("VendorTaxId"));
        assert!(prompt.contains("Invoice from Acme SA"));
    }

    #[test]
    fn test_invoice_prompt_includes_keys_and_text() {
        let prompt = invoice_fields_prompt("Total due 500");
        assert!(prompt.contains("InvoiceId"));
        assert!(prompt.contains("InvoiceDate"));
        assert!(prompt.contains("InvoiceTotal"));
        assert!(prompt.contains("Total due 500"));
    }

    #[test]
    fn test_prompts_do_not_share_keys() {
        let names = names_and_tax_ids_prompt("x");
        let invoice = invoice_fields_prompt("x");
        assert!(!names.contains("InvoiceId"));
        assert!(!invoice.contains("CustomerName"));
    }
}
