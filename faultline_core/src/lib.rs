//! Faultline Core - Route-keyed fault injection for HTTP services
//!
//! This library decides which synthetic anomalies fire around a request:
//! 1. **Registry**: per-route (and wildcard) ordered anomaly lists
//! 2. **Engine**: sequential (isolating) or parallel (propagating) execution
//! 3. **Trigger**: route-agnostic, probability-driven exceptions and Gaussian delays
//!
//! All side effects go through a [`faultline_env::FaultContext`], so the same
//! code runs against tokio in production and a virtual clock in drills.

pub mod anomaly;
pub mod engine;
pub mod random;
pub mod registry;
pub mod request;
pub mod trigger;

// Re-export key types for convenience
pub use anomaly::{Anomaly, AnomalyKind};
pub use engine::{AnomalyEngine, ExecutionMode, ExecutionPlan};
pub use random::RandomSource;
pub use registry::AnomalyRegistry;
pub use request::{ClearAnomaliesRequest, RegisterAnomalyRequest};
pub use trigger::{DrawMode, TriggerOptions, TriggerOutcome, TriggerPolicy};
pub use faultline_env::{AnomalyError, FaultContext, LogLevel, ALL_ROUTES_KEYWORD};
