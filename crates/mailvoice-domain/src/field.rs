//! The fixed set of extractable fields and the `FieldSet` value object

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One invoice/customer attribute the graph extracts.
///
/// The set is closed: every branch requests some subset of these, and the
/// merge step computes its missing-fields report against [`Field::ALL`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Name of the customer being invoiced
    CustomerName,
    /// Customer tax identifier (CUIT or equivalent)
    CustomerTaxId,
    /// Invoice number/identifier
    InvoiceId,
    /// Vendor tax identifier
    VendorTaxId,
    /// Purchase order reference
    PurchaseOrderNumber,
    /// Date the invoice was issued
    InvoiceDate,
    /// Total amount due
    InvoiceTotal,
}

impl Field {
    /// Every extractable field, in report order.
    pub const ALL: [Field; 7] = [
        Field::CustomerName,
        Field::CustomerTaxId,
        Field::InvoiceId,
        Field::VendorTaxId,
        Field::PurchaseOrderNumber,
        Field::InvoiceDate,
        Field::InvoiceTotal,
    ];

    /// Canonical snake_case name, as used in reports and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::CustomerName => "customer_name",
            Field::CustomerTaxId => "customer_tax_id",
            Field::InvoiceId => "invoice_id",
            Field::VendorTaxId => "vendor_tax_id",
            Field::PurchaseOrderNumber => "purchase_order_number",
            Field::InvoiceDate => "invoice_date",
            Field::InvoiceTotal => "invoice_total",
        }
    }

    /// External name used by the extraction models (prompt keys and the
    /// prebuilt invoice model's field names).
    pub fn model_key(&self) -> &'static str {
        match self {
            Field::CustomerName => "CustomerName",
            Field::CustomerTaxId => "CustomerTaxId",
            Field::InvoiceId => "InvoiceId",
            Field::VendorTaxId => "VendorTaxId",
            Field::PurchaseOrderNumber => "PurchaseOrder",
            Field::InvoiceDate => "InvoiceDate",
            Field::InvoiceTotal => "InvoiceTotal",
        }
    }

    /// Look a field up by its external model name.
    pub fn from_model_key(key: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.model_key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown field name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown field name: {0}")]
pub struct FieldParseError(pub String);

impl FromStr for Field {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| FieldParseError(s.to_string()))
    }
}

/// A partial mapping of [`Field`]s to extracted string values.
///
/// Backed by an ordered map so iteration and serialization are stable
/// regardless of insertion order. `merge` is last-write-wins per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeMap<Field, String>);

impl FieldSet {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field value.
    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    /// Get a field's value, if present.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Whether the field has a value.
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Number of fields with values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field has a value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over present fields and their values.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// Merge `other` into `self`, overwriting on key collision.
    pub fn merge(&mut self, other: &FieldSet) {
        for (field, value) in &other.0 {
            self.0.insert(*field, value.clone());
        }
    }

    /// The fields from [`Field::ALL`] that have no value here, in report
    /// order.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| !self.0.contains_key(f))
            .collect()
    }
}

impl FromIterator<(Field, String)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (Field, String)>>(iter: I) -> Self {
        FieldSet(iter.into_iter().collect())
    }
}
