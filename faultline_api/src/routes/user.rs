//! Mock user endpoints
//!
//! Stand-in workload for fault injection. The handlers do no real work;
//! anomalies are applied by the middleware in front of them.

use axum::{extract::Path, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// User payload accepted by create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn list_users() -> Json<Vec<&'static str>> {
    info!("Fetched all users");
    Json(vec!["value1", "value2"])
}

pub async fn get_user(Path(id): Path<u32>) -> Json<&'static str> {
    info!(id, "Fetched user");
    Json("value")
}

pub async fn create_user(Json(user): Json<UserRequest>) -> StatusCode {
    info!(name = %user.name, "Creating user");
    StatusCode::OK
}

pub async fn update_user(Path(id): Path<u32>, Json(user): Json<UserRequest>) -> StatusCode {
    info!(id, name = %user.name, "Updating user");
    StatusCode::OK
}

pub async fn delete_user(Path(id): Path<u32>) -> StatusCode {
    warn!(id, "Deleting user");
    StatusCode::OK
}
