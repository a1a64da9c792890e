//! Trait definitions for the external extraction services
//!
//! These traits define the boundaries between the graph and the services it
//! suspends on. Adapter implementations live in `mailvoice-llm`; the
//! pipeline treats every one of them as an opaque call.

use crate::field::Field;
use crate::mail::Attachment;
use crate::result::PartialResult;
use async_trait::async_trait;

/// Free-text completion model used by the text branches
///
/// The reply is expected to contain one JSON object; decoding it is the
/// caller's concern, not the provider's.
#[async_trait]
pub trait TextModel {
    /// Error type for model calls
    type Error;

    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Vision model extracting fields from images
#[async_trait]
pub trait VisionExtractor {
    /// Error type for extraction calls
    type Error;

    /// Extract the requested fields from each image, one [`PartialResult`]
    /// per image with its token cost filled in. Per-image failures are
    /// reported in the partial's `error` slot.
    async fn extract_fields(
        &self,
        images: &[Attachment],
        fields: &[Field],
    ) -> Result<Vec<PartialResult>, Self::Error>;
}

/// Prebuilt invoice-analysis model extracting fields from PDFs
#[async_trait]
pub trait PrebuiltExtractor {
    /// Error type for extraction calls
    type Error;

    /// Extract the requested fields from each PDF, one [`PartialResult`] per
    /// analyzed page. Does no token accounting.
    async fn extract_fields(
        &self,
        pdfs: &[Attachment],
        fields: &[Field],
    ) -> Result<Vec<PartialResult>, Self::Error>;
}

/// Rasterizes a PDF into one image per page
#[async_trait]
pub trait PdfRasterizer {
    /// Error type for rasterization calls
    type Error;

    /// Render every page of `pdf` at the given DPI. Each returned attachment
    /// keeps the source PDF's file name so downstream results group back to
    /// the original document.
    async fn rasterize(
        &self,
        pdf: &Attachment,
        dpi: u32,
    ) -> Result<Vec<Attachment>, Self::Error>;
}
