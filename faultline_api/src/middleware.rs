//! Per-request anomaly injection

use crate::config::Design;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Runs the configured fault-injection strategy before the handler.
///
/// Under the registry design the request path is the route key. An injected
/// fault short-circuits the handler.
pub async fn inject_anomalies(State(state): State<AppState>, req: Request, next: Next) -> ApiResult<Response> {
    match state.design {
        Design::Registry => {
            let route = req.uri().path().to_string();
            debug!(route = %route, "Applying registered anomalies");
            state.engine.execute(&route, state.plan).await?;
        }
        Design::Probabilistic => {
            let outcome = state.policy.trigger().await?;
            debug!(?outcome, "Trigger applied");
        }
    }

    Ok(next.run(req).await)
}
