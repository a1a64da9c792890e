//! PDF page rasterization
//!
//! The graph rasterizes PDFs into per-page images before the vision pass.
//! The real implementation binds a pdfium library at runtime and is gated
//! behind the `pdfium` feature; builds without it get [`NullRasterizer`],
//! which rejects rasterization with an explicit error instead of silently
//! skipping PDF pages.

use crate::LlmError;
use async_trait::async_trait;
use mailvoice_domain::traits::PdfRasterizer;
use mailvoice_domain::Attachment;

/// Rasterizer stand-in for builds without the `pdfium` feature
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRasterizer;

#[async_trait]
impl PdfRasterizer for NullRasterizer {
    type Error = LlmError;

    async fn rasterize(
        &self,
        pdf: &Attachment,
        _dpi: u32,
    ) -> Result<Vec<Attachment>, Self::Error> {
        Err(LlmError::Raster(format!(
            "cannot rasterize '{}': built without the `pdfium` feature",
            pdf.file_name
        )))
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium_impl::PdfiumRasterizer;

#[cfg(feature = "pdfium")]
mod pdfium_impl {
    use super::*;
    use pdfium_render::prelude::*;
    use std::io::Cursor;
    use tracing::debug;

    /// Renders PDF pages to PNG via a system pdfium library
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PdfiumRasterizer;

    impl PdfiumRasterizer {
        /// Create a rasterizer. The pdfium library is bound per call, so
        /// construction cannot fail.
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl PdfRasterizer for PdfiumRasterizer {
        type Error = LlmError;

        async fn rasterize(
            &self,
            pdf: &Attachment,
            dpi: u32,
        ) -> Result<Vec<Attachment>, Self::Error> {
            let file_name = pdf.file_name.clone();
            let bytes = pdf.content.clone();

            // Rendering is CPU-bound; keep it off the async workers.
            let pages = tokio::task::spawn_blocking(move || render_pages(&file_name, &bytes, dpi))
                .await
                .map_err(|e| LlmError::Raster(format!("render task failed: {}", e)))??;

            debug!(source = %pdf.file_name, pages = pages.len(), dpi, "rasterized pdf");
            Ok(pages)
        }
    }

    fn render_pages(
        file_name: &str,
        bytes: &[u8],
        dpi: u32,
    ) -> Result<Vec<Attachment>, LlmError> {
        let pdfium = Pdfium::new(
            Pdfium::bind_to_system_library()
                .map_err(|e| LlmError::Raster(format!("pdfium binding: {}", e)))?,
        );
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| LlmError::Raster(format!("load '{}': {}", file_name, e)))?;

        // Page sizes are in points (1/72 inch).
        let scale = dpi as f32 / 72.0;
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let mut pages = Vec::new();
        for page in document.pages().iter() {
            let rendered = page
                .render_with_config(&config)
                .map_err(|e| LlmError::Raster(format!("render '{}': {}", file_name, e)))?;
            let image = rendered.as_image();

            let mut png = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|e| LlmError::Raster(format!("encode '{}': {}", file_name, e)))?;

            // Keep the PDF's own name so results group back to the document.
            pages.push(Attachment::new(file_name, png));
        }

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_rasterizer_rejects() {
        let pdf = Attachment::new("invoice.pdf", vec![1, 2, 3]);
        let result = NullRasterizer.rasterize(&pdf, 300).await;
        match result {
            Err(LlmError::Raster(msg)) => assert!(msg.contains("invoice.pdf")),
            other => panic!("expected Raster error, got {:?}", other.err()),
        }
    }
}
