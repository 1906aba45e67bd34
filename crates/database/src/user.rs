//! User operations.

use sqlx::PgPool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Get a user by external identifier, creating it on first reference.
///
/// Concurrent callers may both attempt the insert; `ON CONFLICT DO NOTHING`
/// plus the re-read makes the loser observe the winner's row instead of
/// failing on the unique constraint.
pub async fn get_or_create_user(pool: &PgPool, user_identifier: &str) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (user_identifier)
        VALUES ($1)
        ON CONFLICT (user_identifier) DO NOTHING
        "#,
    )
    .bind(user_identifier)
    .execute(pool)
    .await?;

    get_user_by_identifier(pool, user_identifier).await
}

/// Get a user by external identifier.
pub async fn get_user_by_identifier(pool: &PgPool, user_identifier: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, user_identifier, created_at
        FROM users
        WHERE user_identifier = $1
        "#,
    )
    .bind(user_identifier)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: user_identifier.to_string(),
    })
}

/// Get a user by primary key.
pub async fn get_user(pool: &PgPool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, user_identifier, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}
