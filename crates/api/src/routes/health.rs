//! Health check endpoint.

use axum::Json;
use serde::Serialize;

/// Health response.
#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
}

/// Liveness probe.
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
