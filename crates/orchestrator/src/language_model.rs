//! Model seam for the pipeline.
//!
//! The orchestrator talks to the model through this trait so tests can run
//! the full pipeline with a scripted implementation instead of the network.

use async_trait::async_trait;
use gemini_brain::GeminiBrain;

/// Embedding and generation operations the pipeline needs.
///
/// Both operations are total: `embed` expresses failure as `None`, and
/// `generate` is expected to return fallback text rather than fail.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Map text to a fixed-length vector, or `None` on failure.
    async fn embed(&self, text: &str) -> Option<Vec<f32>>;

    /// Generate a reply from the prompt and assembled context. Never fails;
    /// implementations degrade to a fixed reply on upstream errors.
    async fn generate(&self, prompt: &str, conversation: &str, external: Option<&str>) -> String;
}

#[async_trait]
impl LanguageModel for GeminiBrain {
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        GeminiBrain::embed(self, text).await
    }

    async fn generate(&self, prompt: &str, conversation: &str, external: Option<&str>) -> String {
        GeminiBrain::generate(self, prompt, conversation, external).await
    }
}

/// A scripted model for tests: fixed reply, fixed (or absent) embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticModel {
    /// Reply returned from every `generate` call.
    pub reply: String,
    /// Embedding returned from every `embed` call; `None` simulates an
    /// embedding service outage.
    pub embedding: Option<Vec<f32>>,
}

impl StaticModel {
    /// A model that answers with `reply` and embeds every text as `embedding`.
    pub fn new(reply: impl Into<String>, embedding: Option<Vec<f32>>) -> Self {
        Self {
            reply: reply.into(),
            embedding,
        }
    }
}

#[async_trait]
impl LanguageModel for StaticModel {
    async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
        self.embedding.clone()
    }

    async fn generate(&self, _prompt: &str, _conversation: &str, _external: Option<&str>) -> String {
        self.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_model_scripts_both_operations() {
        let model = StaticModel::new("canned", Some(vec![0.5; 4]));
        assert_eq!(model.embed("anything").await.unwrap().len(), 4);
        assert_eq!(model.generate("p", "", None).await, "canned");
    }

    #[tokio::test]
    async fn test_static_model_can_simulate_embedding_outage() {
        let model = StaticModel::new("canned", None);
        assert!(model.embed("anything").await.is_none());
    }
}
