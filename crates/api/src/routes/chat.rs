//! Chat endpoint: one request runs one full pipeline turn.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use database::Message;
use orchestrator::SessionSnapshot;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::routes::require_identity;
use crate::state::AppState;

/// Incoming chat message. `session_id` is absent when starting a new chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub content: String,
    #[serde(default)]
    pub session_id: Option<i64>,
}

/// A message as returned to the frontend. Embeddings stay server-side.
#[derive(Debug, Serialize)]
pub struct MessageRead {
    pub id: i64,
    pub session_id: i64,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Message> for MessageRead {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            session_id: message.session_id,
            sender: message.sender,
            content: message.content,
            timestamp: message.timestamp,
        }
    }
}

/// A session with its ordered messages.
#[derive(Debug, Serialize)]
pub struct SessionRead {
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<MessageRead>,
}

impl From<SessionSnapshot> for SessionRead {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            id: snapshot.session.id,
            user_id: snapshot.session.user_id,
            title: snapshot.session.title,
            created_at: snapshot.session.created_at,
            messages: snapshot.messages.into_iter().map(MessageRead::from).collect(),
        }
    }
}

/// Process a chat message and return the updated session.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<SessionRead>> {
    let user_identifier = require_identity(&headers)?;

    let snapshot = state
        .chat
        .handle_message(&user_identifier, &payload.content, payload.session_id)
        .await?;

    Ok(Json(SessionRead::from(snapshot)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_session_id_optional() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"content": "hello"}"#).unwrap();
        assert_eq!(request.content, "hello");
        assert!(request.session_id.is_none());
    }

    #[test]
    fn test_message_read_has_no_embedding_field() {
        let read = MessageRead {
            id: 1,
            session_id: 2,
            sender: "assistant".to_string(),
            content: "hi".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&read).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json["sender"], "assistant");
    }
}
