//! Prebuilt invoice-model extraction for PDFs
//!
//! Thin wrapper over a document-analysis REST service: submit the PDF as
//! base64, poll the returned operation until it settles, then map the
//! service's invoice fields onto [`Field`]. One [`PartialResult`] per
//! analyzed document; per-PDF failures land in the partial's `error` slot.

use crate::LlmError;
use async_trait::async_trait;
use base64::Engine;
use mailvoice_domain::traits::PrebuiltExtractor;
use mailvoice_domain::{Attachment, Field, FieldSet, PartialResult};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Model identifier on the analysis service
pub const PREBUILT_MODEL: &str = "prebuilt-invoice";

/// Delay between result polls (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Maximum polls before the analysis is considered stuck
pub const DEFAULT_MAX_POLLS: u32 = 60;

/// Document-analysis client running the prebuilt invoice model
pub struct PrebuiltInvoiceExtractor {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
    poll_interval: Duration,
    max_polls: u32,
}

#[derive(Serialize)]
struct AnalyzeRequest {
    #[serde(rename = "base64Source")]
    base64_source: String,
}

impl PrebuiltInvoiceExtractor {
    /// Create a client for the given analysis endpoint and API key.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Override the poll cadence (interval between polls, maximum polls).
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// Submit one PDF and wait for its analysis result.
    async fn analyze(&self, pdf: &Attachment) -> Result<Value, LlmError> {
        let url = format!(
            "{}/documentModels/{}:analyze?api-version=2024-11-30",
            self.endpoint, PREBUILT_MODEL
        );
        let body = AnalyzeRequest {
            base64_source: base64::engine::general_purpose::STANDARD.encode(&pdf.content),
        };

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("submit failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                LlmError::InvalidResponse("missing operation-location header".to_string())
            })?
            .to_string();

        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let poll = self
                .client
                .get(&operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await
                .map_err(|e| LlmError::Communication(format!("poll failed: {}", e)))?;

            let result: Value = poll
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse(format!("poll reply: {}", e)))?;

            match result.get("status").and_then(Value::as_str) {
                Some("succeeded") => {
                    return result
                        .get("analyzeResult")
                        .cloned()
                        .ok_or_else(|| {
                            LlmError::InvalidResponse("missing analyzeResult".to_string())
                        });
                }
                Some("failed") => {
                    return Err(LlmError::Other(format!(
                        "analysis failed: {}",
                        result.get("error").cloned().unwrap_or(Value::Null)
                    )));
                }
                _ => continue,
            }
        }

        Err(LlmError::Communication("analysis did not settle".to_string()))
    }
}

#[async_trait]
impl PrebuiltExtractor for PrebuiltInvoiceExtractor {
    type Error = LlmError;

    async fn extract_fields(
        &self,
        pdfs: &[Attachment],
        fields: &[Field],
    ) -> Result<Vec<PartialResult>, Self::Error> {
        let mut results = Vec::with_capacity(pdfs.len());

        for pdf in pdfs {
            match self.analyze(pdf).await {
                Ok(analysis) => {
                    let documents = analysis
                        .get("documents")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default();
                    debug!(
                        source = %pdf.file_name,
                        documents = documents.len(),
                        "prebuilt analysis complete"
                    );
                    for (idx, document) in documents.iter().enumerate() {
                        let mut partial =
                            PartialResult::new(&pdf.file_name, idx as u32 + 1);
                        let extracted = fields_from_document(document, fields);
                        partial.missing_fields = fields
                            .iter()
                            .copied()
                            .filter(|f| !extracted.contains(*f))
                            .collect();
                        partial.fields = extracted;
                        results.push(partial);
                    }
                    if documents.is_empty() {
                        let mut partial = PartialResult::new(&pdf.file_name, 1);
                        partial.missing_fields = fields.to_vec();
                        results.push(partial);
                    }
                }
                Err(e) => {
                    warn!(source = %pdf.file_name, error = %e, "prebuilt analysis failed");
                    let mut partial = PartialResult::new(&pdf.file_name, 1);
                    partial.missing_fields = fields.to_vec();
                    partial.error = Some(e.to_string());
                    results.push(partial);
                }
            }
        }

        Ok(results)
    }
}

/// Map one analyzed document's fields onto the requested [`Field`]s.
///
/// The service reports each field as an object carrying a `content` string;
/// unknown names and empty contents are skipped.
fn fields_from_document(document: &Value, requested: &[Field]) -> FieldSet {
    let mut fields = FieldSet::new();
    let Some(reported) = document.get("fields").and_then(Value::as_object) else {
        return fields;
    };

    for field in requested {
        if let Some(content) = reported
            .get(field.model_key())
            .and_then(|f| f.get("content"))
            .and_then(Value::as_str)
        {
            if !content.is_empty() {
                fields.insert(*field, content);
            }
        }
    }
    fields
}
