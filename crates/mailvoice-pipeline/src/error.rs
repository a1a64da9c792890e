//! Error types for the pipeline

use thiserror::Error;

/// Errors that can occur during a graph run
///
/// Any of these aborts the whole request; there is no partial-success path.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Text model call failed
    #[error("text model error in '{branch}': {message}")]
    Text {
        /// Branch that made the call
        branch: &'static str,
        /// Underlying adapter error
        message: String,
    },

    /// Vision extraction call failed
    #[error("vision error in '{branch}': {message}")]
    Vision {
        /// Branch that made the call
        branch: &'static str,
        /// Underlying adapter error
        message: String,
    },

    /// Prebuilt document analysis failed
    #[error("prebuilt extraction error: {0}")]
    Prebuilt(String),

    /// PDF rasterization failed
    #[error("rasterization error: {0}")]
    Raster(String),

    /// A model reply contained no parseable JSON object
    #[error("invalid model reply in '{branch}': {message}")]
    InvalidReply {
        /// Branch that received the reply
        branch: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// A model reply was valid JSON but lacked an expected key
    #[error("model reply in '{branch}' is missing key '{key}'")]
    MissingKey {
        /// Branch that received the reply
        branch: &'static str,
        /// The absent key, by its external name
        key: &'static str,
    },

    /// Email text exceeds the configured maximum
    #[error("text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}
