//! Third-party integration storage.

use sqlx::PgPool;

use crate::error::Result;
use crate::models::UserIntegration;

/// Credentials and identity captured when an account is (re)connected.
#[derive(Debug, Clone)]
pub struct IntegrationUpsert<'a> {
    pub user_id: i64,
    pub integration_type: &'a str,
    /// Vault ciphertext.
    pub access_token: &'a str,
    /// Vault ciphertext, when the provider issued one.
    pub refresh_token: Option<&'a str>,
    pub integration_user_id: &'a str,
    pub integration_username: &'a str,
    pub metadata: serde_json::Value,
}

/// Insert or refresh an integration row.
///
/// Reconnecting reuses the existing (user, type) row — active or not —
/// overwriting credentials, flipping it active, and bumping `connected_at`.
pub async fn upsert_integration(pool: &PgPool, params: &IntegrationUpsert<'_>) -> Result<()> {
    let existing = get_integration(pool, params.user_id, params.integration_type).await?;

    match existing {
        Some(row) => {
            sqlx::query(
                r#"
                UPDATE user_integrations
                SET access_token = $2,
                    refresh_token = $3,
                    integration_user_id = $4,
                    integration_username = $5,
                    is_active = TRUE,
                    integration_metadata = $6,
                    connected_at = now()
                WHERE id = $1
                "#,
            )
            .bind(row.id)
            .bind(params.access_token)
            .bind(params.refresh_token)
            .bind(params.integration_user_id)
            .bind(params.integration_username)
            .bind(&params.metadata)
            .execute(pool)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO user_integrations
                    (user_id, integration_type, access_token, refresh_token,
                     integration_user_id, integration_username, is_active, integration_metadata)
                VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
                "#,
            )
            .bind(params.user_id)
            .bind(params.integration_type)
            .bind(params.access_token)
            .bind(params.refresh_token)
            .bind(params.integration_user_id)
            .bind(params.integration_username)
            .bind(&params.metadata)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

/// Get the latest integration row for (user, type), active or not.
pub async fn get_integration(
    pool: &PgPool,
    user_id: i64,
    integration_type: &str,
) -> Result<Option<UserIntegration>> {
    let row = sqlx::query_as::<_, UserIntegration>(
        r#"
        SELECT id, user_id, integration_type, access_token, refresh_token,
               integration_user_id, integration_username, is_active,
               integration_metadata, connected_at
        FROM user_integrations
        WHERE user_id = $1 AND integration_type = $2
        ORDER BY connected_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(integration_type)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Get the active integration row for (user, type), if any.
pub async fn get_active_integration(
    pool: &PgPool,
    user_id: i64,
    integration_type: &str,
) -> Result<Option<UserIntegration>> {
    let row = sqlx::query_as::<_, UserIntegration>(
        r#"
        SELECT id, user_id, integration_type, access_token, refresh_token,
               integration_user_id, integration_username, is_active,
               integration_metadata, connected_at
        FROM user_integrations
        WHERE user_id = $1 AND integration_type = $2 AND is_active
        "#,
    )
    .bind(user_id)
    .bind(integration_type)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deactivate an integration. The row is kept for history; reconnecting
/// reactivates it. Returns whether a row was deactivated.
pub async fn deactivate_integration(
    pool: &PgPool,
    user_id: i64,
    integration_type: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE user_integrations
        SET is_active = FALSE
        WHERE user_id = $1 AND integration_type = $2 AND is_active
        "#,
    )
    .bind(user_id)
    .bind(integration_type)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
