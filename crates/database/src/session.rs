//! Chat session operations.

use sqlx::PgPool;

use crate::error::{DatabaseError, Result};
use crate::models::ChatSession;

/// Create a session for a user, optionally titled.
pub async fn create_session(
    pool: &PgPool,
    user_id: i64,
    title: Option<&str>,
) -> Result<ChatSession> {
    let session = sqlx::query_as::<_, ChatSession>(
        r#"
        INSERT INTO chat_sessions (user_id, title)
        VALUES ($1, $2)
        RETURNING id, user_id, title, created_at
        "#,
    )
    .bind(user_id)
    .bind(title)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Get a session by id.
pub async fn get_session(pool: &PgPool, id: i64) -> Result<ChatSession> {
    sqlx::query_as::<_, ChatSession>(
        r#"
        SELECT id, user_id, title, created_at
        FROM chat_sessions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "ChatSession",
        id: id.to_string(),
    })
}

/// Get a session by id only if it is owned by the given user.
///
/// Returns `Ok(None)` both when the session does not exist and when it
/// belongs to another user; callers fall back to creating a fresh session
/// rather than attaching to a foreign one.
pub async fn get_session_for_user(
    pool: &PgPool,
    id: i64,
    user_id: i64,
) -> Result<Option<ChatSession>> {
    let session = sqlx::query_as::<_, ChatSession>(
        r#"
        SELECT id, user_id, title, created_at
        FROM chat_sessions
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// List a user's sessions, newest first.
pub async fn list_sessions(
    pool: &PgPool,
    user_id: i64,
    skip: i64,
    limit: i64,
) -> Result<Vec<ChatSession>> {
    let sessions = sqlx::query_as::<_, ChatSession>(
        r#"
        SELECT id, user_id, title, created_at
        FROM chat_sessions
        WHERE user_id = $1
        ORDER BY created_at DESC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

/// Set the session title only when it is still unset.
///
/// Used by the orchestrator's finalize step to backfill a title when a race
/// left it NULL.
pub async fn set_title_if_missing(pool: &PgPool, id: i64, title: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE chat_sessions
        SET title = $2
        WHERE id = $1 AND title IS NULL
        "#,
    )
    .bind(id)
    .bind(title)
    .execute(pool)
    .await?;

    Ok(())
}
