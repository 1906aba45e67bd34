//! Context retrieval and formatting.
//!
//! Given the embedding of an incoming prompt, pulls the top-K most similar
//! prior messages from the user's recent history and, when the prompt asks
//! about repository activity, a digest of live GitHub data. Retrieval is
//! strictly best-effort: every failure degrades to empty or partial context
//! and never fails the turn.

use std::sync::Arc;

use database::{message, models::Sender, Database, RetrievedMessage};
use pgvector::Vector;
use tracing::{debug, warn};

use crate::augment;
use crate::connections::IntegrationManager;

/// Number of prior messages retrieved for context.
pub const TOP_K_CONTEXT: i64 = 3;

/// Only messages newer than this many days are retrieval candidates.
pub const RECENCY_WINDOW_DAYS: i64 = 30;

/// Separator inserted between results from different sessions.
const SESSION_SEPARATOR: &str = "---";

/// Context assembled for one turn.
///
/// `conversation` is empty when nothing relevant was found (or retrieval
/// failed); `external` is present only when augmentation produced a digest
/// or an explanatory note. Absence is a typed state, not a sentinel.
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    /// Formatted lines of similar prior messages.
    pub conversation: String,
    /// Authorized external data digest, when the prompt triggered one.
    pub external: Option<String>,
}

impl RetrievedContext {
    /// Context with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether both parts are absent.
    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty() && self.external.is_none()
    }
}

/// Retrieves conversational and external context for a turn.
pub struct ContextRetriever {
    db: Database,
    integrations: Arc<IntegrationManager>,
}

impl ContextRetriever {
    /// Create a retriever over the given collaborators.
    pub fn new(db: Database, integrations: Arc<IntegrationManager>) -> Self {
        Self { db, integrations }
    }

    /// Assemble context for one turn.
    ///
    /// `exclude_message_id` is the id of the just-persisted prompt message,
    /// kept out of its own context query.
    pub async fn retrieve(
        &self,
        user_id: i64,
        prompt: &str,
        exclude_message_id: i64,
        query: Option<&Vector>,
    ) -> RetrievedContext {
        let conversation = match query {
            None => {
                debug!("No query embedding; skipping similarity retrieval");
                String::new()
            }
            Some(vector) => {
                match message::nearest_messages(
                    self.db.pool(),
                    user_id,
                    exclude_message_id,
                    vector,
                    RECENCY_WINDOW_DAYS,
                    TOP_K_CONTEXT,
                )
                .await
                {
                    Ok(rows) => format_conversation(&rows),
                    Err(e) => {
                        warn!("Context retrieval failed, degrading to empty: {}", e);
                        String::new()
                    }
                }
            }
        };

        let external = if augment::mentions_github(prompt) {
            self.external_context(user_id, prompt).await
        } else {
            None
        };

        RetrievedContext {
            conversation,
            external,
        }
    }

    /// Fetch the GitHub digest for a triggered prompt, degrading every
    /// failure to an explanatory note.
    async fn external_context(&self, user_id: i64, prompt: &str) -> Option<String> {
        let token = match self.integrations.access_token(user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                return Some("unable to access external data: GitHub is not connected".to_string())
            }
            Err(e) => {
                warn!("Credential lookup failed during augmentation: {}", e);
                return Some(format!("unable to access external data: {}", e));
            }
        };

        match augment::build_digest(self.integrations.github(), &token, prompt).await {
            Ok(digest) if digest.is_empty() => None,
            Ok(digest) => Some(digest),
            Err(e) => {
                warn!("GitHub augmentation failed, degrading to note: {}", e);
                Some(format!("unable to access external data: {}", e))
            }
        }
    }
}

/// Render retrieved messages in ranking order, one `Sender: content` line
/// each, separated when consecutive results come from different sessions.
pub fn format_conversation(messages: &[RetrievedMessage]) -> String {
    let mut out = String::new();
    let mut last_session: Option<i64> = None;

    for message in messages {
        if let Some(previous) = last_session {
            if previous != message.session_id {
                out.push('\n');
                out.push_str(SESSION_SEPARATOR);
            }
        }
        if !out.is_empty() {
            out.push('\n');
        }

        out.push_str(Sender::from_tag(&message.sender).label());
        out.push_str(": ");
        out.push_str(&message.content);

        last_session = Some(message.session_id);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn retrieved(id: i64, session_id: i64, sender: &str, content: &str) -> RetrievedMessage {
        RetrievedMessage {
            id,
            session_id,
            sender: sender.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_conversation(&[]), "");
    }

    #[test]
    fn test_format_single_session() {
        let rows = vec![
            retrieved(1, 10, "user", "show me last week's numbers"),
            retrieved(2, 10, "assistant", "here they are"),
        ];

        assert_eq!(
            format_conversation(&rows),
            "User: show me last week's numbers\nAssistant: here they are"
        );
    }

    #[test]
    fn test_format_separates_sessions_in_ranking_order() {
        let rows = vec![
            retrieved(1, 10, "user", "first hit"),
            retrieved(2, 11, "user", "second hit"),
            retrieved(3, 11, "assistant", "third hit"),
        ];

        assert_eq!(
            format_conversation(&rows),
            "User: first hit\n---\nUser: second hit\nAssistant: third hit"
        );
    }

    #[test]
    fn test_format_does_not_reorder() {
        // Ranking order comes from the query; formatting must preserve it
        // even when ids are not ascending.
        let rows = vec![
            retrieved(9, 10, "assistant", "closest"),
            retrieved(2, 10, "user", "further"),
        ];

        let formatted = format_conversation(&rows);
        let closest = formatted.find("closest").unwrap();
        let further = formatted.find("further").unwrap();
        assert!(closest < further);
    }

    #[test]
    fn test_retrieved_context_empty_state() {
        assert!(RetrievedContext::empty().is_empty());
        assert!(!RetrievedContext {
            conversation: String::new(),
            external: Some("digest".to_string()),
        }
        .is_empty());
    }
}
