//! Mailvoice Adapter Layer
//!
//! Implementations of the extraction-service traits from `mailvoice-domain`.
//! The pipeline treats every one of these as an opaque call; all network
//! plumbing, auth, and reply decoding stays inside this crate.
//!
//! # Adapters
//!
//! - [`ChatTextModel`]: chat-completions text model for the free-text
//!   branches
//! - [`VisionFieldExtractor`]: per-image field extraction over the same chat
//!   API with image payloads
//! - [`PrebuiltInvoiceExtractor`]: document-analysis service running the
//!   prebuilt invoice model over PDFs
//! - [`PdfiumRasterizer`] (feature `pdfium`): renders PDF pages to PNG;
//!   [`NullRasterizer`] is the always-available stand-in that rejects
//!   rasterization
//! - Deterministic mocks for every trait, for tests and development
//!
//! # Examples
//!
//! ```
//! use mailvoice_llm::MockTextModel;
//! use mailvoice_domain::traits::TextModel;
//!
//! # async fn example() {
//! let model = MockTextModel::new(r#"{"InvoiceId": "A-0001"}"#);
//! let reply = model.generate("test prompt").await.unwrap();
//! assert!(reply.contains("A-0001"));
//! # }
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod document;
mod mock;
pub mod raster;
pub mod vision;

use thiserror::Error;

pub use chat::ChatTextModel;
pub use document::PrebuiltInvoiceExtractor;
pub use mock::{
    MockPrebuiltExtractor, MockRasterizer, MockTextModel, MockVisionExtractor,
};
pub use raster::NullRasterizer;
#[cfg(feature = "pdfium")]
pub use raster::PdfiumRasterizer;
pub use vision::VisionFieldExtractor;

/// Errors that can occur inside an extraction adapter
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("communication error: {0}")]
    Communication(String),

    /// The service replied with something the adapter cannot decode
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The service rejected the call for rate limiting
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Requested model is not available on the endpoint
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// PDF rasterization failed or is unavailable in this build
    #[error("rasterization error: {0}")]
    Raster(String),

    /// Generic adapter error
    #[error("adapter error: {0}")]
    Other(String),
}
