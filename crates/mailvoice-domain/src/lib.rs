//! Mailvoice Domain Layer
//!
//! Core data model and boundary traits for the extraction graph. Everything
//! the other crates exchange (requests, classified state, partial results,
//! the final report) is defined here, along with the trait interfaces for
//! the external extraction services.
//!
//! ## Key Concepts
//!
//! - **Field**: one of the seven invoice/customer attributes being extracted
//! - **FieldSet**: a partial mapping of fields to extracted string values
//! - **Source**: the grouping key for merged results: `"Mail"` for the email
//!   body, or an attachment's file name
//! - **PartialResult**: one branch's contribution for one source/page
//! - **ExtractionReport**: the consolidated per-source records plus the
//!   token-cost total
//!
//! ## Architecture
//!
//! This crate holds no extraction logic. The graph itself lives in
//! `mailvoice-pipeline`; the adapter implementations behind the traits live
//! in `mailvoice-llm`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod field;
pub mod mail;
pub mod result;
pub mod traits;

// Re-exports for convenience
pub use field::{Field, FieldParseError, FieldSet};
pub use mail::{Attachment, ClassifiedMail, MailRequest};
pub use result::{ExtractionReport, PartialResult, SourceRecord};
