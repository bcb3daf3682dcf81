//! Health handler

use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub design: String,
    pub uptime_secs: u64,
    pub registered_anomalies: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        design: format!("{:?}", state.design).to_lowercase(),
        uptime_secs: state.uptime_secs(),
        registered_anomalies: state.registry.len(),
    })
}
