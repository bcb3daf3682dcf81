//! SimWorld - The drill harness container.

use crate::context::SimContext;

use faultline_core::{
    Anomaly, AnomalyEngine, AnomalyError, AnomalyRegistry, DrawMode, RandomSource, RegisterAnomalyRequest,
    TriggerPolicy,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Configuration for a drill run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Route keys the workload picks from
    pub routes: Vec<String>,

    /// Draw coupling for the trigger policy
    pub draw_mode: DrawMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            routes: ["/api/User", "/api/User/1", "/orders", "/health"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            draw_mode: DrawMode::Shared,
        }
    }
}

/// The SimWorld - one registry, engine and trigger policy on a virtual clock.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Shared simulation context (virtual clock + journal)
    pub context: Arc<SimContext>,

    /// Route registry shared with the engine
    pub registry: Arc<AnomalyRegistry>,

    /// Registry-driven execution
    pub engine: AnomalyEngine<SimContext>,

    /// Route-agnostic probabilistic policy
    pub policy: TriggerPolicy<SimContext>,

    /// Picks which route each simulated request hits
    workload: ChaCha8Rng,
}

impl SimWorld {
    /// Creates a new SimWorld with the given configuration.
    pub fn new(config: SimConfig) -> Self {
        // Derive separate seeds for different subsystems
        let engine_seed = config.seed;
        let trigger_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let workload_seed = config.seed.wrapping_mul(0x517cc1b727220a95);

        let context = SimContext::shared(config.seed);
        let registry = AnomalyRegistry::shared();
        let engine = AnomalyEngine::with_rng(
            Arc::clone(&context),
            Arc::clone(&registry),
            RandomSource::seeded(engine_seed),
        );
        let policy = TriggerPolicy::with_rng(Arc::clone(&context), RandomSource::seeded(trigger_seed))
            .with_draw_mode(config.draw_mode);

        Self {
            config,
            context,
            registry,
            engine,
            policy,
            workload: ChaCha8Rng::seed_from_u64(workload_seed),
        }
    }

    /// Registers an anomaly from a JSON payload, as the HTTP boundary would.
    pub fn register_json(&self, body: &str) -> Result<Arc<Anomaly>, AnomalyError> {
        let request = RegisterAnomalyRequest::from_json(body)?;
        Ok(self.registry.register_anomaly(request.to_anomaly()?))
    }

    /// Picks the route for the next simulated request.
    pub fn next_route(&mut self) -> String {
        if self.config.routes.is_empty() {
            return "/".to_string();
        }
        let idx = self.workload.gen_range(0..self.config.routes.len());
        self.config.routes[idx].clone()
    }
}
