//! Integration endpoints: OAuth connect/callback/disconnect, status, and
//! on-demand GitHub queries.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use axum::Json;
use github_client::GitHubUser;
use orchestrator::{GitHubQuery, IntegrationStatus};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::routes::require_identity;
use crate::state::AppState;

/// Status of all known integrations for the caller.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub integrations: Vec<IntegrationStatus>,
}

/// Response to a connect request: where to send the user.
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub auth_url: String,
}

/// OAuth callback parameters echoed by the provider.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// Simple acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
}

/// Envelope for on-demand query results.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report connected/disconnected per integration type.
pub async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>> {
    let user_identifier = require_identity(&headers)?;
    let integrations = state.integrations.status(&user_identifier).await?;
    Ok(Json(StatusResponse { integrations }))
}

/// Begin the GitHub OAuth flow.
pub async fn github_connect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ConnectResponse>> {
    let user_identifier = require_identity(&headers)?;
    let auth_url = state.integrations.connect(&user_identifier).await?;
    Ok(Json(ConnectResponse { auth_url }))
}

/// Complete the GitHub OAuth flow and bounce back to the frontend.
pub async fn github_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let redirect_url = state
        .integrations
        .callback(&params.code, &params.state)
        .await?;

    Ok(Redirect::temporary(&redirect_url))
}

/// Disconnect the GitHub integration.
pub async fn github_disconnect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Ack>> {
    let user_identifier = require_identity(&headers)?;
    state.integrations.disconnect(&user_identifier).await?;

    Ok(Json(Ack {
        message: "GitHub integration disconnected",
    }))
}

/// The connected GitHub account's identity.
pub async fn github_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<GitHubUser>> {
    let user_identifier = require_identity(&headers)?;
    let identity = state.integrations.github_identity(&user_identifier).await?;
    Ok(Json(identity))
}

/// Run an on-demand GitHub data query for the caller.
///
/// Failures are absorbed into the `{success, error}` envelope — the
/// frontend treats this endpoint as best-effort. Unknown `query_type` tags
/// never reach the handler; deserialization rejects them.
pub async fn github_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<GitHubQuery>,
) -> Result<Json<QueryResponse>> {
    let user_identifier = require_identity(&headers)?;

    let response = match state.integrations.query(&user_identifier, query).await {
        Ok(data) => QueryResponse {
            success: true,
            data: Some(data),
            error: None,
        },
        Err(e) => {
            warn!("GitHub query failed: {}", e);
            QueryResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            }
        }
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_envelope_shape() {
        let ok = QueryResponse {
            success: true,
            data: Some(serde_json::json!([])),
            error: None,
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());

        let failed = QueryResponse {
            success: false,
            data: None,
            error: Some("github integration not connected".to_string()),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
    }
}
