//! Error types for the Gemini client.

use thiserror::Error;

/// Errors that can occur when calling the Gemini API.
///
/// These never cross the crate boundary from `embed` or `generate`; both
/// entry points degrade internally. The type exists so the lower-level
/// request helpers can use `?` and log the cause.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-2xx response.
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response parsed but carried no usable content.
    #[error("no content in Gemini response")]
    MissingContent,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
