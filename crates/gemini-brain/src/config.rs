//! Configuration for the Gemini client.

use std::env;

use crate::error::GeminiError;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "embedding-001";

/// Default generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-1.5-flash-latest";

/// Configuration for [`crate::GeminiBrain`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    pub api_key: String,

    /// API base URL (overridable for tests).
    pub api_base: String,

    /// Model used for embeddings.
    pub embedding_model: String,

    /// Model used for generation.
    pub generation_model: String,

    /// Maximum tokens in a generated reply.
    pub max_output_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            max_output_tokens: Some(1024),
            temperature: None,
        }
    }
}

impl GeminiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `GEMINI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - API base URL (default: generativelanguage.googleapis.com/v1beta)
    /// - `GEMINI_EMBEDDING_MODEL` - Embedding model (default: embedding-001)
    /// - `GEMINI_GENERATION_MODEL` - Generation model (default: gemini-1.5-flash-latest)
    /// - `GEMINI_MAX_TOKENS` - Max output tokens (default: 1024)
    /// - `GEMINI_TEMPERATURE` - Sampling temperature (default: unset)
    pub fn from_env() -> Result<Self, GeminiError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Configuration("GEMINI_API_KEY not set".to_string()))?;

        let api_base =
            env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let embedding_model = env::var("GEMINI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let generation_model = env::var("GEMINI_GENERATION_MODEL")
            .unwrap_or_else(|_| DEFAULT_GENERATION_MODEL.to_string());

        let max_output_tokens = env::var("GEMINI_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(Some(1024));

        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok());

        Ok(Self {
            api_key,
            api_base,
            embedding_model,
            generation_model,
            max_output_tokens,
            temperature,
        })
    }

    /// Create a new configuration with the required key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set the embedding model.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set the generation model.
    pub fn with_generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = model.into();
        self
    }

    /// Set the max output tokens.
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// URL for the embedContent endpoint.
    pub fn embed_url(&self) -> String {
        format!(
            "{}/models/{}:embedContent",
            self.api_base, self.embedding_model
        )
    }

    /// URL for the generateContent endpoint.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base, self.generation_model
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let config = GeminiConfig::new("key");
        assert_eq!(
            config.embed_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:embedContent"
        );
        assert!(config.generate_url().ends_with("gemini-1.5-flash-latest:generateContent"));
    }

    #[test]
    fn test_builders() {
        let config = GeminiConfig::new("key")
            .with_api_base("http://localhost:1234")
            .with_generation_model("gemini-test")
            .with_max_output_tokens(64)
            .with_temperature(0.2);

        assert_eq!(config.generate_url(), "http://localhost:1234/models/gemini-test:generateContent");
        assert_eq!(config.max_output_tokens, Some(64));
        assert_eq!(config.temperature, Some(0.2));
    }
}
