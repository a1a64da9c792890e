//! Mailvoice Server
//!
//! HTTP surface for the extraction graph: `POST /extract` runs the graph
//! for one email, `GET /health` reports liveness. Configuration comes from
//! a TOML file wiring the chat and document services.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod wire;

use config::ServerConfig;
use handlers::{create_router, AppState};
use mailvoice_llm::{ChatTextModel, PrebuiltInvoiceExtractor, VisionFieldExtractor};
use mailvoice_pipeline::Pipeline;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[cfg(feature = "pdfium")]
type Rasterizer = mailvoice_llm::PdfiumRasterizer;
#[cfg(not(feature = "pdfium"))]
type Rasterizer = mailvoice_llm::NullRasterizer;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("server error: {0}")]
    Server(String),
}

/// Start the HTTP server
///
/// Initializes tracing, wires the adapters from configuration, and serves
/// the axum router until shutdown.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Mailvoice server");
    info!("Bind address: {}", config.bind_addr());
    info!("Chat endpoint: {}", config.chat.endpoint);
    info!("Document endpoint: {}", config.document.endpoint);

    let text_model = ChatTextModel::new(
        config.chat.endpoint.clone(),
        config.chat.api_key.clone(),
        config.chat.model.clone(),
    );
    let vision = VisionFieldExtractor::new(
        config.chat.endpoint.clone(),
        config.chat.api_key.clone(),
        config.chat.model.clone(),
    );
    let prebuilt = PrebuiltInvoiceExtractor::new(
        config.document.endpoint.clone(),
        config.document.api_key.clone(),
    );
    let rasterizer = Rasterizer::default();

    let pipeline = Pipeline::new(
        text_model,
        vision,
        prebuilt,
        rasterizer,
        config.pipeline.clone(),
    );
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_test_config() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert!(config.pipeline.validate().is_ok());
    }
}
