//! GeminiBrain implementation using the Gemini REST API.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api_types::{
    ApiErrorBody, Content, EmbedContentRequest, EmbedContentResponse, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig,
};
use crate::config::GeminiConfig;
use crate::error::GeminiError;
use crate::EMBEDDING_DIM;

/// Fixed persona instruction for every generation call.
pub const SYSTEM_PROMPT: &str = "Your name is Prism. You are an AI assistant designed to help \
    users understand their data better, often through visualizations and insightful analysis. \
    Be helpful and friendly.";

/// Authorization language added when live account data is part of the prompt.
const EXTERNAL_DATA_INSTRUCTION: &str = "The user has connected an external account and \
    explicitly authorized you to read and discuss the live account data included under \
    [AUTHORIZED EXTERNAL DATA]. Treat that data as accurate and current.";

/// Fixed user-facing reply when the generation call fails. The pipeline
/// always answers; upstream failures never abort a turn.
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error processing your request with the LLM.";

/// Client for embeddings and response generation.
pub struct GeminiBrain {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBrain {
    /// Create a new GeminiBrain with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                GeminiError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Create a GeminiBrain from environment variables.
    ///
    /// See [`GeminiConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, GeminiError> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Embed text into a fixed-length vector.
    ///
    /// Returns `None` when the upstream call fails or returns a vector of
    /// unexpected width. A missing embedding is a valid state for a message;
    /// the caller stores NULL and skips similarity retrieval for it.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.embed_inner(text).await {
            Ok(values) if values.len() == EMBEDDING_DIM => Some(values),
            Ok(values) => {
                warn!(
                    got = values.len(),
                    expected = EMBEDDING_DIM,
                    "Embedding has unexpected dimensionality, dropping"
                );
                None
            }
            Err(e) => {
                warn!("Embedding call failed: {}", e);
                None
            }
        }
    }

    async fn embed_inner(&self, text: &str) -> Result<Vec<f32>, GeminiError> {
        let request = EmbedContentRequest {
            model: format!("models/{}", self.config.embedding_model),
            content: Content::text(text),
        };

        let response = self
            .client
            .post(self.config.embed_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status.as_u16(), response.text().await.unwrap_or_default()));
        }

        let parsed: EmbedContentResponse = response.json().await?;
        Ok(parsed.embedding.values)
    }

    /// Generate a reply from the composed prompt.
    ///
    /// `conversation` is the formatted block of retrieved prior messages
    /// (may be empty); `external` is the authorized-external-data block when
    /// augmentation produced one. On any upstream failure this returns
    /// [`FALLBACK_REPLY`] — it never propagates an error.
    pub async fn generate(
        &self,
        prompt: &str,
        conversation: &str,
        external: Option<&str>,
    ) -> String {
        match self.generate_inner(prompt, conversation, external).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Generation call failed: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    async fn generate_inner(
        &self,
        prompt: &str,
        conversation: &str,
        external: Option<&str>,
    ) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            system_instruction: Some(Content::text(compose_system_instruction(
                external.is_some(),
            ))),
            contents: vec![Content::user(compose_user_text(
                prompt,
                conversation,
                external,
            ))],
            generation_config: Some(GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
            }),
        };

        debug!(model = %self.config.generation_model, "Sending generation request");

        let response = self
            .client
            .post(self.config.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status.as_u16(), response.text().await.unwrap_or_default()));
        }

        let completion: GenerateContentResponse = response.json().await?;

        completion
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(Content::joined_text)
            .filter(|text| !text.is_empty())
            .ok_or(GeminiError::MissingContent)
    }
}

/// Build the system instruction, adding the authorization language only when
/// external data is present in the prompt.
fn compose_system_instruction(has_external: bool) -> String {
    if has_external {
        format!("{}\n\n{}", SYSTEM_PROMPT, EXTERNAL_DATA_INSTRUCTION)
    } else {
        SYSTEM_PROMPT.to_string()
    }
}

/// Build the user-visible prompt text: retrieved context first, then any
/// external-data block, then the request itself.
fn compose_user_text(prompt: &str, conversation: &str, external: Option<&str>) -> String {
    let mut text = String::new();

    if !conversation.is_empty() {
        text.push_str("Based on the following context from the user's conversations:\n---\n");
        text.push_str(conversation);
        text.push_str("\n---\n\n");
    }

    if let Some(external) = external {
        text.push_str("[AUTHORIZED EXTERNAL DATA]\n");
        text.push_str(external);
        text.push_str("\n\n");
    }

    text.push_str("User's request: ");
    text.push_str(prompt);
    text
}

/// Map a non-2xx body to a typed error, preferring the structured message.
fn api_error(status: u16, body: String) -> GeminiError {
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    GeminiError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_user_text_plain() {
        let text = compose_user_text("what's up?", "", None);
        assert_eq!(text, "User's request: what's up?");
    }

    #[test]
    fn test_compose_user_text_with_context() {
        let text = compose_user_text("and then?", "User: hi\nAssistant: hello", None);
        assert!(text.starts_with("Based on the following context"));
        assert!(text.contains("User: hi\nAssistant: hello"));
        assert!(text.ends_with("User's request: and then?"));
    }

    #[test]
    fn test_compose_user_text_with_external_data() {
        let text = compose_user_text("repo status?", "", Some("Repository: octocat/widget"));
        assert!(text.contains("[AUTHORIZED EXTERNAL DATA]\nRepository: octocat/widget"));
        assert!(text.ends_with("User's request: repo status?"));
    }

    #[test]
    fn test_system_instruction_authorization_language() {
        assert_eq!(compose_system_instruction(false), SYSTEM_PROMPT);
        assert!(compose_system_instruction(true).contains("AUTHORIZED EXTERNAL DATA"));
    }

    #[test]
    fn test_api_error_extracts_message() {
        let err = api_error(
            429,
            r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#.to_string(),
        );
        match err {
            GeminiError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_failure_degrades_to_none() {
        // Nothing listens on this port; the call fails fast.
        let config = GeminiConfig::new("test-key").with_api_base("http://127.0.0.1:9");
        let brain = GeminiBrain::new(config).unwrap();

        assert!(brain.embed("hello").await.is_none());
    }

    #[tokio::test]
    async fn test_generate_failure_degrades_to_fallback() {
        let config = GeminiConfig::new("test-key").with_api_base("http://127.0.0.1:9");
        let brain = GeminiBrain::new(config).unwrap();

        let reply = brain.generate("hello", "", None).await;
        assert_eq!(reply, FALLBACK_REPLY);
    }
}
