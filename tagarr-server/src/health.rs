//! Health and status endpoints over the injected [`AppStatus`].

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde_json::json;
use tagarr_core::{AppStatus, StatusSnapshot};

pub fn router(status: AppStatus) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status_snapshot))
        .with_state(status)
}

async fn health(State(status): State<AppStatus>) -> (StatusCode, Json<serde_json::Value>) {
    let snapshot = status.snapshot();
    let code = if snapshot.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(json!({ "healthy": snapshot.healthy })))
}

async fn status_snapshot(State(status): State<AppStatus>) -> Json<StatusSnapshot> {
    Json(status.snapshot())
}
