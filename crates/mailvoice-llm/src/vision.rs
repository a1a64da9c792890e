//! Vision field extraction over the chat API
//!
//! One call per image: the image rides along as a base64 data URL and the
//! model is instructed to answer with a single JSON object of the requested
//! field names. Per-image failures are recorded in the partial's `error`
//! slot so one unreadable scan does not abort a whole batch.

use crate::LlmError;
use async_trait::async_trait;
use base64::Engine;
use mailvoice_domain::traits::VisionExtractor;
use mailvoice_domain::{Attachment, Field, FieldSet, PartialResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for a single vision request (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Vision-capable chat model extracting fields from images
pub struct VisionFieldExtractor {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct VisionRequest {
    model: String,
    messages: Vec<VisionMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct VisionMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct VisionChoice {
    message: VisionReply,
}

#[derive(Deserialize)]
struct VisionReply {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u64,
}

impl VisionFieldExtractor {
    /// Create an extractor for the given endpoint, API key, and model.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("reqwest client with static configuration");

        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    async fn extract_one(
        &self,
        image: &Attachment,
        fields: &[Field],
    ) -> Result<(FieldSet, u64), LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let data_url = format!(
            "data:{};base64,{}",
            mime_for(&image.file_name),
            base64::engine::general_purpose::STANDARD.encode(&image.content)
        );

        let request_body = VisionRequest {
            model: self.model.clone(),
            messages: vec![VisionMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: vision_prompt(fields),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: VisionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse reply: {}", e)))?;

        let tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("empty choices".to_string()))?;

        let extracted = fields_from_reply(&content, fields)?;
        Ok((extracted, tokens))
    }
}

#[async_trait]
impl VisionExtractor for VisionFieldExtractor {
    type Error = LlmError;

    async fn extract_fields(
        &self,
        images: &[Attachment],
        fields: &[Field],
    ) -> Result<Vec<PartialResult>, Self::Error> {
        let mut results = Vec::with_capacity(images.len());
        let mut pages_seen: HashMap<String, u32> = HashMap::new();

        for image in images {
            let page = pages_seen.entry(image.file_name.clone()).or_insert(0);
            *page += 1;

            let mut partial = PartialResult::new(&image.file_name, *page);
            match self.extract_one(image, fields).await {
                Ok((extracted, tokens)) => {
                    partial.missing_fields = fields
                        .iter()
                        .copied()
                        .filter(|f| !extracted.contains(*f))
                        .collect();
                    partial.fields = extracted;
                    partial.tokens = tokens;
                    debug!(
                        source = %image.file_name,
                        page = *page,
                        tokens,
                        "vision extraction complete"
                    );
                }
                Err(e) => {
                    warn!(source = %image.file_name, page = *page, error = %e, "vision extraction failed");
                    partial.missing_fields = fields.to_vec();
                    partial.error = Some(e.to_string());
                }
            }
            results.push(partial);
        }

        Ok(results)
    }
}

/// Instruction block sent with every image
fn vision_prompt(fields: &[Field]) -> String {
    let keys: Vec<&str> = fields.iter().map(|f| f.model_key()).collect();
    format!(
        "Extract the following fields from the attached invoice image: {}.\n\
         Answer with ONLY one JSON object whose keys are exactly those names.\n\
         Omit any field that is not visible in the image. No markdown, no prose.",
        keys.join(", ")
    )
}

/// Decode the model's reply into a field set.
///
/// Tolerates a markdown code fence around the object; anything else
/// unparseable is an invalid response.
fn fields_from_reply(reply: &str, requested: &[Field]) -> Result<FieldSet, LlmError> {
    let trimmed = reply.trim();
    let body = if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        lines[1..lines.len().saturating_sub(1)].join("\n")
    } else {
        trimmed.to_string()
    };

    let json: Value = serde_json::from_str(&body)
        .map_err(|e| LlmError::InvalidResponse(format!("reply is not JSON: {}", e)))?;
    let obj = json
        .as_object()
        .ok_or_else(|| LlmError::InvalidResponse("reply is not a JSON object".to_string()))?;

    let mut fields = FieldSet::new();
    for field in requested {
        match obj.get(field.model_key()) {
            Some(Value::String(s)) if !s.is_empty() => fields.insert(*field, s.clone()),
            Some(Value::Number(n)) => fields.insert(*field, n.to_string()),
            Some(Value::Bool(b)) => fields.insert(*field, b.to_string()),
            _ => {}
        }
    }
    Ok(fields)
}

/// Best-effort MIME type from the file extension
fn mime_for(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".bmp") {
        "image/bmp"
    } else if lower.ends_with(".tiff") {
        "image/tiff"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "image/png"
    }
}
