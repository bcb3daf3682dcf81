//! `/api/Anomaly` handlers
//!
//! Under the registry design these list, register and clear per-route
//! anomalies. Under the probabilistic design they read, replace and reset
//! the global trigger options.

use crate::config::Design;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use faultline_core::{Anomaly, ClearAnomaliesRequest, RegisterAnomalyRequest, TriggerOptions};
use tracing::error;

/// Registered anomalies, or the current options.
pub async fn get_anomalies(State(state): State<AppState>) -> Response {
    match state.design {
        Design::Registry => {
            let anomalies: Vec<Anomaly> = state
                .registry
                .all_anomalies()
                .iter()
                .map(|anomaly| anomaly.as_ref().clone())
                .collect();
            Json(anomalies).into_response()
        }
        Design::Probabilistic => Json(state.policy.options().as_ref().clone()).into_response(),
    }
}

/// Registers one anomaly, or replaces the options.
///
/// The body is parsed here rather than by an extractor so that a malformed
/// registration surfaces as a registration fault.
pub async fn register_anomaly(State(state): State<AppState>, body: String) -> ApiResult<StatusCode> {
    match state.design {
        Design::Registry => {
            let anomaly = RegisterAnomalyRequest::from_json(&body)
                .and_then(|request| request.to_anomaly())
                .map_err(|e| {
                    error!(error = %e, "Unable to register anomaly");
                    e
                })?;
            state.registry.register_anomaly(anomaly);
        }
        Design::Probabilistic => {
            let options: TriggerOptions =
                serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            state.policy.update_options(options)?;
        }
    }

    Ok(StatusCode::OK)
}

/// Clears one route's bucket, or disables the options.
///
/// An empty body clears the wildcard bucket.
pub async fn clear_anomalies(State(state): State<AppState>, body: String) -> ApiResult<StatusCode> {
    match state.design {
        Design::Registry => {
            let request = if body.trim().is_empty() {
                ClearAnomaliesRequest::default()
            } else {
                serde_json::from_str::<ClearAnomaliesRequest>(&body)
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?
            };
            state.registry.clear_anomalies(&request.route);
        }
        Design::Probabilistic => state.policy.disable(),
    }

    Ok(StatusCode::OK)
}
