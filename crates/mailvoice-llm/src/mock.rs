//! Deterministic mock adapters
//!
//! Pre-configured, network-free implementations of every boundary trait.
//! Used by the pipeline and server test suites; public so downstream users
//! can drive the graph in their own tests.

use crate::LlmError;
use async_trait::async_trait;
use mailvoice_domain::traits::{
    PdfRasterizer, PrebuiltExtractor, TextModel, VisionExtractor,
};
use mailvoice_domain::{Attachment, Field, FieldSet, PartialResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock text model with canned replies
///
/// Replies are selected by substring match against the prompt (prompts are
/// full instruction templates, so exact-match keys would be unusable), in
/// insertion order, falling back to the default reply.
///
/// # Examples
///
/// ```
/// use mailvoice_llm::MockTextModel;
/// use mailvoice_domain::traits::TextModel;
///
/// # async fn example() {
/// let mut model = MockTextModel::new("{}");
/// model.add_reply("names and tax", r#"{"CustomerName": "Acme SA"}"#);
/// let reply = model.generate("extract names and tax ids ...").await.unwrap();
/// assert!(reply.contains("Acme"));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockTextModel {
    default_reply: String,
    replies: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockTextModel {
    /// Create a mock returning `reply` for every prompt.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            default_reply: reply.into(),
            replies: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Sleep this long before answering, to reorder branch completion in
    /// concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reply with `reply` whenever the prompt contains `needle`.
    pub fn add_reply(&mut self, needle: impl Into<String>, reply: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push((needle.into(), reply.into()));
    }

    /// Make every call fail with the given message.
    pub fn fail_with(&mut self, message: impl Into<String>) {
        *self.fail.lock().unwrap() = Some(message.into());
    }

    /// Number of times `generate` was called.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl TextModel for MockTextModel {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.fail.lock().unwrap().clone() {
            return Err(LlmError::Other(message));
        }

        let replies = self.replies.lock().unwrap();
        for (needle, reply) in replies.iter() {
            if prompt.contains(needle.as_str()) {
                return Ok(reply.clone());
            }
        }
        Ok(self.default_reply.clone())
    }
}

/// Mock vision extractor reporting fixed fields per image
#[derive(Debug, Clone, Default)]
pub struct MockVisionExtractor {
    fields: FieldSet,
    tokens_per_image: u64,
    fail: Option<String>,
    soft_errors: HashMap<String, String>,
    seen: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockVisionExtractor {
    /// Create a mock reporting no fields and no cost.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these fields for every processed image.
    pub fn with_fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    /// Report this token cost for every processed image.
    pub fn with_tokens(mut self, tokens_per_image: u64) -> Self {
        self.tokens_per_image = tokens_per_image;
        self
    }

    /// Record a soft error (in the partial's `error` slot) for images with
    /// this file name.
    pub fn with_soft_error(
        mut self,
        file_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.soft_errors.insert(file_name.into(), message.into());
        self
    }

    /// Make the whole extraction call fail.
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    /// Sleep this long before answering, to reorder branch completion in
    /// concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// File names received across every call, in order.
    pub fn seen_sources(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionExtractor for MockVisionExtractor {
    type Error = LlmError;

    async fn extract_fields(
        &self,
        images: &[Attachment],
        fields: &[Field],
    ) -> Result<Vec<PartialResult>, Self::Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.fail {
            return Err(LlmError::Other(message.clone()));
        }

        let mut pages_seen: HashMap<String, u32> = HashMap::new();
        let mut results = Vec::with_capacity(images.len());
        for image in images {
            self.seen.lock().unwrap().push(image.file_name.clone());
            let page = pages_seen.entry(image.file_name.clone()).or_insert(0);
            *page += 1;

            let mut partial = PartialResult::new(&image.file_name, *page);
            if let Some(message) = self.soft_errors.get(&image.file_name) {
                partial.missing_fields = fields.to_vec();
                partial.error = Some(message.clone());
            } else {
                partial.fields = self.fields.clone();
                partial.missing_fields = fields
                    .iter()
                    .copied()
                    .filter(|f| !self.fields.contains(*f))
                    .collect();
            }
            partial.tokens = self.tokens_per_image;
            results.push(partial);
        }
        Ok(results)
    }
}

/// Mock prebuilt extractor reporting fixed fields per PDF
#[derive(Debug, Clone, Default)]
pub struct MockPrebuiltExtractor {
    fields: FieldSet,
    fail: Option<String>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl MockPrebuiltExtractor {
    /// Create a mock reporting no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these fields for every analyzed PDF.
    pub fn with_fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    /// Make the whole extraction call fail.
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    /// File names received across every call, in order.
    pub fn seen_sources(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrebuiltExtractor for MockPrebuiltExtractor {
    type Error = LlmError;

    async fn extract_fields(
        &self,
        pdfs: &[Attachment],
        fields: &[Field],
    ) -> Result<Vec<PartialResult>, Self::Error> {
        if let Some(message) = &self.fail {
            return Err(LlmError::Other(message.clone()));
        }

        let mut results = Vec::with_capacity(pdfs.len());
        for pdf in pdfs {
            self.seen.lock().unwrap().push(pdf.file_name.clone());
            let mut partial = PartialResult::new(&pdf.file_name, 1);
            partial.fields = self.fields.clone();
            partial.missing_fields = fields
                .iter()
                .copied()
                .filter(|f| !self.fields.contains(*f))
                .collect();
            results.push(partial);
        }
        Ok(results)
    }
}

/// Mock rasterizer emitting placeholder pages
#[derive(Debug, Clone)]
pub struct MockRasterizer {
    pages_per_pdf: usize,
    fail: Option<String>,
    dpis: Arc<Mutex<Vec<u32>>>,
}

impl Default for MockRasterizer {
    fn default() -> Self {
        Self {
            pages_per_pdf: 1,
            fail: None,
            dpis: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockRasterizer {
    /// Create a mock emitting one page per PDF.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit this many pages per PDF.
    pub fn with_pages(mut self, pages_per_pdf: usize) -> Self {
        self.pages_per_pdf = pages_per_pdf;
        self
    }

    /// Make every rasterization call fail.
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    /// DPI values received across every call, in order.
    pub fn seen_dpis(&self) -> Vec<u32> {
        self.dpis.lock().unwrap().clone()
    }
}

#[async_trait]
impl PdfRasterizer for MockRasterizer {
    type Error = LlmError;

    async fn rasterize(
        &self,
        pdf: &Attachment,
        dpi: u32,
    ) -> Result<Vec<Attachment>, Self::Error> {
        self.dpis.lock().unwrap().push(dpi);

        if let Some(message) = &self.fail {
            return Err(LlmError::Raster(message.clone()));
        }

        Ok((0..self.pages_per_pdf)
            .map(|i| Attachment::new(&pdf.file_name, vec![0x89, 0x50, 0x4e, 0x47, i as u8]))
            .collect())
    }
}
