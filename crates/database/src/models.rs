//! Database models.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::FromRow;

/// A user, identified externally by an opaque identifier supplied by the
/// frontend's auth provider.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    /// Opaque external identifier (unique).
    pub user_identifier: String,
    pub created_at: DateTime<Utc>,
}

/// A chat session owned by one user.
#[derive(Debug, Clone, FromRow)]
pub struct ChatSession {
    pub id: i64,
    pub user_id: i64,
    /// Derived from the first message's prefix; may lag creation briefly.
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One message of a conversation. Immutable once written.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub session_id: i64,
    /// `user` or `assistant`.
    pub sender: String,
    pub content: String,
    /// NULL when the embedding call failed; a valid, expected state.
    pub embedding: Option<Vector>,
    pub timestamp: DateTime<Utc>,
}

/// A message row as returned by the similarity query; no embedding payload.
#[derive(Debug, Clone, FromRow)]
pub struct RetrievedMessage {
    pub id: i64,
    pub session_id: i64,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A third-party account connection. One active row per (user, type).
#[derive(Debug, Clone, FromRow)]
pub struct UserIntegration {
    pub id: i64,
    pub user_id: i64,
    pub integration_type: String,
    /// Vault ciphertext, never the raw token.
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub integration_user_id: Option<String>,
    pub integration_username: Option<String>,
    pub is_active: bool,
    pub integration_metadata: Option<serde_json::Value>,
    pub connected_at: DateTime<Utc>,
}

/// Message sender tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Storage form (`user` / `assistant`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    /// Capitalized form used when formatting context lines.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistant => "Assistant",
        }
    }

    /// Parse the storage form; unknown tags fall back to `User` so a
    /// malformed historical row never breaks formatting.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "assistant" => Sender::Assistant,
            _ => Sender::User,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_roundtrip() {
        assert_eq!(Sender::from_tag(Sender::User.as_str()), Sender::User);
        assert_eq!(
            Sender::from_tag(Sender::Assistant.as_str()),
            Sender::Assistant
        );
    }

    #[test]
    fn test_sender_labels() {
        assert_eq!(Sender::User.label(), "User");
        assert_eq!(Sender::Assistant.label(), "Assistant");
    }

    #[test]
    fn test_unknown_tag_defaults_to_user() {
        assert_eq!(Sender::from_tag("llm"), Sender::User);
    }
}
