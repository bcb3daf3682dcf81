//! API Router configuration

mod anomaly;
mod health;
mod user;

pub use anomaly::{clear_anomalies, get_anomalies, register_anomaly};
pub use health::{health_check, HealthCheckResponse};
pub use user::UserRequest;

use crate::middleware::inject_anomalies;
use crate::state::AppState;
use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    // Workload routes pass through anomaly injection
    let user_routes = Router::new()
        .route("/api/User", get(user::list_users).post(user::create_user))
        .route(
            "/api/User/:id",
            get(user::get_user).put(user::update_user).delete(user::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), inject_anomalies));

    let router = Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/Anomaly",
            get(get_anomalies).post(register_anomaly).delete(clear_anomalies),
        )
        .merge(user_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
