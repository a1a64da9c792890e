//! Mailvoice Extraction Pipeline
//!
//! The extraction graph itself: classify the request, route by attachment
//! type, fan the branches out concurrently, and merge their partial results
//! into one consolidated report.
//!
//! # Architecture
//!
//! ```text
//!               ┌─ names-and-tax-ids ──┐
//! Request ──►   ├─ invoice-fields ─────┼─► merge fields ─┐
//! classify      ├─ vision-from-images ─┼─────────────────┼─► aggregate ─► Report
//!   + route     └─ prebuilt-from-pdf ──┴── vision pass ──┘
//! ```
//!
//! The two text branches always run; the router schedules the image and PDF
//! branches only when their bucket is non-empty. The join is a barrier: the
//! aggregator runs exactly once, over contributions collected in fixed
//! branch-declaration order, so the report never depends on which branch
//! happened to finish first.
//!
//! # Example Usage
//!
//! ```no_run
//! use mailvoice_pipeline::{Pipeline, PipelineConfig};
//! use mailvoice_llm::{MockPrebuiltExtractor, MockRasterizer, MockTextModel, MockVisionExtractor};
//! use mailvoice_domain::MailRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(
//!     MockTextModel::new(r#"{"CustomerName": "Acme SA", "CustomerTaxId": "30-1", "VendorTaxId": "30-2", "InvoiceId": "A-1", "InvoiceDate": "2025-01-01", "InvoiceTotal": "500"}"#),
//!     MockVisionExtractor::new(),
//!     MockPrebuiltExtractor::new(),
//!     MockRasterizer::new(),
//!     PipelineConfig::default(),
//! );
//!
//! let request = MailRequest {
//!     subject: "Invoice #123".to_string(),
//!     body: "Total due 500".to_string(),
//!     attachments: vec![],
//! };
//!
//! let report = pipeline.run(&request).await?;
//! println!("{} sources, {} tokens", report.extractions.len(), report.tokens);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod classify;
mod config;
mod error;
mod merge;
mod pipeline;
mod prompt;
mod reply;
mod route;

pub use classify::{classify, IMAGE_EXTENSIONS, PDF_EXTENSION};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use merge::{aggregate, merge_fields, Contribution, MAIL_SOURCE};
pub use pipeline::Pipeline;
pub use reply::{extract_json_object, parse_reply_fields};
pub use route::{route, Branch, RoutePlan};
