//! Session listing endpoints.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use database::{message, session, user, DatabaseError};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::routes::chat::{MessageRead, SessionRead};
use crate::routes::require_identity;
use crate::state::AppState;

/// Pagination parameters.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

/// A session without its messages, for listings.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// List the caller's sessions, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<SessionSummary>>> {
    let user_identifier = require_identity(&headers)?;

    // A caller we have never seen simply has no sessions yet.
    let user = match user::get_user_by_identifier(state.db.pool(), &user_identifier).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound { .. }) => return Ok(Json(Vec::new())),
        Err(e) => return Err(e.into()),
    };

    let sessions = session::list_sessions(
        state.db.pool(),
        user.id,
        page.skip.max(0),
        page.limit.clamp(1, 100),
    )
    .await?;

    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionSummary {
                id: s.id,
                user_id: s.user_id,
                title: s.title,
                created_at: s.created_at,
            })
            .collect(),
    ))
}

/// Fetch one session with its ordered messages. A session owned by another
/// user is reported as not found, never exposed.
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SessionRead>> {
    let user_identifier = require_identity(&headers)?;

    let user = match user::get_user_by_identifier(state.db.pool(), &user_identifier).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound { .. }) => return Err(ApiError::NotFound("session")),
        Err(e) => return Err(e.into()),
    };

    let chat_session = session::get_session_for_user(state.db.pool(), id, user.id)
        .await?
        .ok_or(ApiError::NotFound("session"))?;

    let messages = message::list_session_messages(state.db.pool(), chat_session.id).await?;

    Ok(Json(SessionRead {
        id: chat_session.id,
        user_id: chat_session.user_id,
        title: chat_session.title,
        created_at: chat_session.created_at,
        messages: messages.into_iter().map(MessageRead::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 10);
    }
}
