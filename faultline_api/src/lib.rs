//! Faultline HTTP service
//!
//! Exposes the anomaly registry (or the probabilistic trigger options) over
//! `/api/Anomaly`, and a mock `/api/User` workload whose requests pass
//! through anomaly injection.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Design, ServiceConfig};
pub use error::{ApiError, ServiceError};
pub use routes::create_router;
pub use server::Server;
pub use state::AppState;
