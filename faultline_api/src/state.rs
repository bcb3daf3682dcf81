//! Application state for API handlers

use crate::config::{Design, ServiceConfig};
use faultline_core::{AnomalyEngine, AnomalyRegistry, ExecutionPlan, RandomSource, TriggerPolicy};
use faultline_env::TokioContext;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Which design backs the anomaly endpoints
    pub design: Design,

    /// How the engine runs a route's anomalies
    pub plan: ExecutionPlan,

    /// Route registry
    pub registry: Arc<AnomalyRegistry>,

    /// Registry-driven engine
    pub engine: Arc<AnomalyEngine<TokioContext>>,

    /// Global-options trigger
    pub policy: Arc<TriggerPolicy<TokioContext>>,

    /// Service version
    pub version: String,

    /// Service start time
    pub started_at: Instant,
}

impl AppState {
    /// Create new application state from configuration
    pub fn new(config: &ServiceConfig) -> Self {
        let seed = config.engine.seed;
        let ctx = match seed {
            Some(seed) => TokioContext::with_seed(seed),
            None => TokioContext::new(),
        };
        let ctx = Arc::new(ctx);

        let registry = AnomalyRegistry::shared();
        let engine = AnomalyEngine::new(Arc::clone(&ctx), Arc::clone(&registry));

        // Keep the trigger stream apart from the shuffle stream
        let trigger_rng = RandomSource::from_seed(seed.map(|s| s.wrapping_mul(0x9e3779b97f4a7c15)));
        let policy = TriggerPolicy::with_rng(ctx, trigger_rng).with_draw_mode(config.trigger.draw_mode);

        Self {
            design: config.engine.design,
            plan: config.engine.plan(),
            registry,
            engine: Arc::new(engine),
            policy: Arc::new(policy),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Instant::now(),
        }
    }

    /// Uptime in whole seconds
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
