//! HTTP request handlers
//!
//! Implements the extraction and health endpoints using axum. Handlers are
//! generic over the pipeline's adapter parameters, so the mock stack drives
//! the exact same routing code in tests.

use crate::wire::{self, WireRequest};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use mailvoice_domain::traits::{
    PdfRasterizer, PrebuiltExtractor, TextModel, VisionExtractor,
};
use mailvoice_domain::ExtractionReport;
use mailvoice_pipeline::{Pipeline, PipelineError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

/// Shared application state
pub struct AppState<T, V, P, R> {
    /// The extraction pipeline
    pub pipeline: Arc<Pipeline<T, V, P, R>>,
}

impl<T, V, P, R> Clone for AppState<T, V, P, R> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Malformed request (400)
    BadRequest(String),
    /// Pipeline failure (500)
    Pipeline(PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Pipeline(e) => {
                error!(error = %e, "extraction failed");
                // No partial data leaves the service on failure.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "extraction failed".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

/// POST /extract - Run the extraction graph for one email
async fn extract<T, V, P, R>(
    State(state): State<AppState<T, V, P, R>>,
    Json(body): Json<Value>,
) -> Result<Json<ExtractionReport>, AppError>
where
    T: TextModel + Send + Sync + 'static,
    V: VisionExtractor + Send + Sync + 'static,
    P: PrebuiltExtractor + Send + Sync + 'static,
    R: PdfRasterizer + Send + Sync + 'static,
    T::Error: Display + Send,
    V::Error: Display + Send,
    P::Error: Display + Send,
    R::Error: Display + Send,
{
    let envelope: WireRequest = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("invalid request body: {}", e)))?;
    let request =
        wire::decode_request(envelope).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let request_id = Uuid::now_v7();
    let span = info_span!("extract", %request_id);
    let report = state
        .pipeline
        .run(&request)
        .instrument(span)
        .await
        .map_err(AppError::Pipeline)?;

    debug!(%request_id, missing = ?report.missing_fields(), "missing fields by source");
    Ok(Json(report))
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router<T, V, P, R>(state: AppState<T, V, P, R>) -> AxumRouter
where
    T: TextModel + Send + Sync + 'static,
    V: VisionExtractor + Send + Sync + 'static,
    P: PrebuiltExtractor + Send + Sync + 'static,
    R: PdfRasterizer + Send + Sync + 'static,
    T::Error: Display + Send,
    V::Error: Display + Send,
    P::Error: Display + Send,
    R::Error: Display + Send,
{
    AxumRouter::new()
        .route("/extract", post(extract::<T, V, P, R>))
        .route("/health", get(health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use mailvoice_llm::{
        MockPrebuiltExtractor, MockRasterizer, MockTextModel, MockVisionExtractor,
    };
    use mailvoice_pipeline::PipelineConfig;
    use tower::ServiceExt; // for oneshot

    type MockState =
        AppState<MockTextModel, MockVisionExtractor, MockPrebuiltExtractor, MockRasterizer>;

    fn create_test_state(text_model: MockTextModel) -> MockState {
        let pipeline = Pipeline::new(
            text_model,
            MockVisionExtractor::new(),
            MockPrebuiltExtractor::new(),
            MockRasterizer::new(),
            PipelineConfig::default(),
        );
        AppState {
            pipeline: Arc::new(pipeline),
        }
    }

    fn full_text_model() -> MockTextModel {
        let mut model = MockTextModel::new("{}");
        model.add_reply(
            "CustomerName",
            r#"{"CustomerName": "Acme SA", "CustomerTaxId": "30-1", "VendorTaxId": "30-2"}"#,
        );
        model.add_reply(
            "InvoiceId",
            r#"{"InvoiceId": "A-0001", "InvoiceDate": "2025-01-15", "InvoiceTotal": "500.00"}"#,
        );
        model
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state(full_text_model()));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_extract_without_attachments() {
        let app = create_router(create_test_state(full_text_model()));

        let request = Request::builder()
            .method("POST")
            .uri("/extract")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"asunto": "Invoice #123", "cuerpo": "Total due 500", "adjuntos": []}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let report: ExtractionReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report.extractions.len(), 1);
        assert_eq!(report.extractions[0].source, "Mail");
        assert_eq!(report.tokens, 0);
    }

    #[tokio::test]
    async fn test_extract_rejects_non_list_adjuntos() {
        let app = create_router(create_test_state(full_text_model()));

        let request = Request::builder()
            .method("POST")
            .uri("/extract")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"asunto": "a", "cuerpo": "b", "adjuntos": "scan.png"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(error.error.contains("adjuntos"));
    }

    #[tokio::test]
    async fn test_extract_rejects_missing_fields() {
        let app = create_router(create_test_state(full_text_model()));

        let request = Request::builder()
            .method("POST")
            .uri("/extract")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"asunto": "only a subject"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_a_generic_500() {
        let mut failing = MockTextModel::new("{}");
        failing.fail_with("model offline");
        let app = create_router(create_test_state(failing));

        let request = Request::builder()
            .method("POST")
            .uri("/extract")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"asunto": "a", "cuerpo": "b", "adjuntos": []}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        // Internal detail stays in the logs, not the response.
        assert_eq!(error.error, "extraction failed");
    }

    #[tokio::test]
    async fn test_extract_with_base64_attachment() {
        let state = create_test_state(full_text_model());
        let app = create_router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/extract")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"asunto": "a", "cuerpo": "b", "adjuntos": [{"file_name": "scan.png", "base64_content": "aGVsbG8="}]}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let report: ExtractionReport = serde_json::from_slice(&bytes).unwrap();
        let sources: Vec<&str> = report
            .extractions
            .iter()
            .map(|r| r.source.as_str())
            .collect();
        assert_eq!(sources, vec!["Mail", "scan.png"]);
    }
}
