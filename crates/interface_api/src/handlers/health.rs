//! Health handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Liveness probe
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe; verifies database connectivity
pub async fn readiness_check(State(state): State<AppState>) -> Json<Value> {
    let database = sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map(|_| "ok")
        .unwrap_or("unavailable");

    Json(json!({ "status": "ok", "database": database }))
}
