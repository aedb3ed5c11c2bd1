use crate::AppState;
use crate::config::AuthMethod;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub region: String,
    pub bucket: Option<String>,
    pub auth_method: AuthMethod,
}

/// Reports the configured target. Does not probe the storage backend.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health and storage target", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        region: state.config.region.clone(),
        bucket: state.config.bucket.clone(),
        auth_method: state.config.auth_method(),
    })
}
