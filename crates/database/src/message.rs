//! Message operations, including the vector similarity query.

use pgvector::Vector;
use sqlx::PgPool;

use crate::error::{DatabaseError, Result};
use crate::models::{Message, RetrievedMessage, Sender};
use crate::EMBEDDING_DIM;

/// Insert a message and return its id.
///
/// The embedding is optional; a `None` records that the embedding call
/// failed for this message. A present embedding must match the schema's
/// vector width.
pub async fn create_message(
    pool: &PgPool,
    session_id: i64,
    sender: Sender,
    content: &str,
    embedding: Option<Vector>,
) -> Result<i64> {
    if let Some(ref vector) = embedding {
        let got = vector.as_slice().len();
        if got != EMBEDDING_DIM {
            return Err(DatabaseError::EmbeddingDimension {
                got,
                expected: EMBEDDING_DIM,
            });
        }
    }

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO messages (session_id, sender, content, embedding)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(session_id)
    .bind(sender.as_str())
    .bind(content)
    .bind(embedding)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// List a session's messages in conversation (insertion) order.
pub async fn list_session_messages(pool: &PgPool, session_id: i64) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, session_id, sender, content, embedding, timestamp
        FROM messages
        WHERE session_id = $1
        ORDER BY id
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Nearest-neighbor search over one user's message history.
///
/// Considers messages across all of the user's sessions that carry an
/// embedding and fall within the recency window, excluding the message that
/// triggered the query. Results come back in ascending L2 distance order,
/// truncated to `limit`.
pub async fn nearest_messages(
    pool: &PgPool,
    user_id: i64,
    exclude_message_id: i64,
    query: &Vector,
    window_days: i64,
    limit: i64,
) -> Result<Vec<RetrievedMessage>> {
    let rows = sqlx::query_as::<_, RetrievedMessage>(
        r#"
        SELECT m.id, m.session_id, m.sender, m.content, m.timestamp
        FROM messages m
        JOIN chat_sessions s ON s.id = m.session_id
        WHERE s.user_id = $1
          AND m.id <> $2
          AND m.embedding IS NOT NULL
          AND m.timestamp >= now() - make_interval(days => $3)
        ORDER BY m.embedding <-> $4
        LIMIT $5
        "#,
    )
    .bind(user_id)
    .bind(exclude_message_id)
    .bind(window_days as i32)
    .bind(query)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedding_dimension_validated_before_query() {
        // A lazy pool never connects; the width check fires first.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();

        let result = create_message(
            &pool,
            1,
            Sender::User,
            "hello",
            Some(Vector::from(vec![0.0f32; 3])),
        )
        .await;

        assert!(matches!(
            result,
            Err(DatabaseError::EmbeddingDimension {
                got: 3,
                expected: EMBEDDING_DIM
            })
        ));
    }
}
