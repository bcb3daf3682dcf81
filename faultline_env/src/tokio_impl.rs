//! Production implementation of FaultContext using Tokio.

use crate::{FaultContext, LogLevel};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Production context backed by Tokio timers and `tracing`.
///
/// This is the "real" implementation used by the HTTP service.
/// Time comes from the system clock, log records go to the installed
/// subscriber under the `faultline::anomaly` target.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,

    /// Optional master seed (unseeded in production by default)
    seed: Option<u64>,
}

impl TokioContext {
    /// Creates a new, unseeded TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            seed: None,
        }
    }

    /// Creates a context whose randomness is pinned to `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            start: Instant::now(),
            seed: Some(seed),
        }
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaultContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn emit_log(&self, level: LogLevel, route: &str, message: &str) {
        // tracing needs the level at compile time
        match level {
            LogLevel::Trace => tracing::trace!(target: "faultline::anomaly", route, "{}", message),
            LogLevel::Debug => tracing::debug!(target: "faultline::anomaly", route, "{}", message),
            LogLevel::Information => tracing::info!(target: "faultline::anomaly", route, "{}", message),
            LogLevel::Warning => tracing::warn!(target: "faultline::anomaly", route, "{}", message),
            LogLevel::Error | LogLevel::Critical => {
                tracing::error!(target: "faultline::anomaly", route, critical = level == LogLevel::Critical, "{}", message)
            }
            LogLevel::None => {}
        }
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }
}
