//! Main orchestrator that runs one chat turn end-to-end.

use std::sync::Arc;

use database::{message, session, user, ChatSession, Database, DatabaseError, Message, Sender};
use pgvector::Vector;
use tracing::{debug, info, warn};

use crate::context::{ContextRetriever, RetrievedContext};
use crate::language_model::LanguageModel;

/// Maximum characters of the first message used as a session title.
const TITLE_PREFIX_LEN: usize = 60;

/// A session with its ordered messages, as returned to the caller after a
/// completed turn.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: ChatSession,
    pub messages: Vec<Message>,
}

/// Orchestrates one chat turn per incoming message.
///
/// The turn resolves the user and session, persists the user turn, retrieves
/// context, generates a reply, persists the assistant turn, and returns the
/// full session. Degraded stages (missing embedding, failed augmentation,
/// failed generation) never abort the turn; only persistence failures do.
pub struct ChatOrchestrator<M: LanguageModel> {
    db: Database,
    model: M,
    retriever: ContextRetriever,
}

impl<M: LanguageModel> ChatOrchestrator<M> {
    /// Create an orchestrator with the given components.
    pub fn new(db: Database, model: M, retriever: ContextRetriever) -> Self {
        Self {
            db,
            model,
            retriever,
        }
    }

    /// Get the model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Process one incoming message end-to-end.
    ///
    /// A supplied `session_id` is reused only when the session belongs to
    /// the resolved user; otherwise a fresh session is created — a foreign
    /// session id never receives writes.
    pub async fn handle_message(
        &self,
        user_identifier: &str,
        content: &str,
        session_id: Option<i64>,
    ) -> Result<SessionSnapshot, DatabaseError> {
        // RESOLVE_USER
        let user = user::get_or_create_user(self.db.pool(), user_identifier).await?;

        // RESOLVE_SESSION
        let chat_session = self.resolve_session(user.id, session_id, content).await?;
        info!(
            user_id = user.id,
            session_id = chat_session.id,
            "Processing chat turn"
        );

        // PERSIST_USER_TURN: embed best-effort, then store so the message id
        // exists before retrieval and can be excluded from its own query.
        let prompt_embedding = self.model.embed(content).await.map(Vector::from);
        if prompt_embedding.is_none() {
            debug!("Prompt embedding unavailable; persisting without one");
        }
        let user_message_id = message::create_message(
            self.db.pool(),
            chat_session.id,
            Sender::User,
            content,
            prompt_embedding.clone(),
        )
        .await?;

        // RETRIEVE_CONTEXT
        let context = self
            .retriever
            .retrieve(user.id, content, user_message_id, prompt_embedding.as_ref())
            .await;
        log_context(&context);

        // GENERATE — total: upstream failure yields the fixed fallback text.
        let reply = self
            .model
            .generate(content, &context.conversation, context.external.as_deref())
            .await;

        // PERSIST_ASSISTANT_TURN
        let reply_embedding = self.model.embed(&reply).await.map(Vector::from);
        message::create_message(
            self.db.pool(),
            chat_session.id,
            Sender::Assistant,
            &reply,
            reply_embedding,
        )
        .await?;

        // FINALIZE: make sure the session carries a title, then return it
        // with its ordered messages.
        session::set_title_if_missing(self.db.pool(), chat_session.id, &session_title(content))
            .await?;

        let final_session = session::get_session(self.db.pool(), chat_session.id).await?;
        let messages = message::list_session_messages(self.db.pool(), chat_session.id).await?;

        Ok(SessionSnapshot {
            session: final_session,
            messages,
        })
    }

    /// Reuse the supplied session when it belongs to the user; otherwise
    /// create a fresh one titled from the incoming message.
    async fn resolve_session(
        &self,
        user_id: i64,
        session_id: Option<i64>,
        content: &str,
    ) -> Result<ChatSession, DatabaseError> {
        if let Some(id) = session_id {
            match session::get_session_for_user(self.db.pool(), id, user_id).await? {
                Some(existing) => return Ok(existing),
                None => {
                    warn!(
                        session_id = id,
                        user_id, "Session missing or foreign; creating a new one"
                    );
                }
            }
        }

        session::create_session(self.db.pool(), user_id, Some(&session_title(content))).await
    }
}

/// Derive a session title from the first message's prefix.
fn session_title(content: &str) -> String {
    let trimmed = content.trim();
    let title: String = trimmed.chars().take(TITLE_PREFIX_LEN).collect();
    title
}

fn log_context(context: &RetrievedContext) {
    if context.is_empty() {
        debug!("No context retrieved for this turn");
    } else {
        debug!(
            conversation_chars = context.conversation.len(),
            has_external = context.external.is_some(),
            "Context assembled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_title_truncates_on_char_boundary() {
        let long = "å".repeat(100);
        let title = session_title(&long);
        assert_eq!(title.chars().count(), TITLE_PREFIX_LEN);
    }

    #[test]
    fn test_session_title_trims_whitespace() {
        assert_eq!(session_title("  hello there  "), "hello there");
    }

    #[test]
    fn test_session_title_short_content_kept_whole() {
        assert_eq!(session_title("What's new in my repo?"), "What's new in my repo?");
    }
}
