//! Anomaly Execution Engine.
//!
//! Runs the anomalies that apply to a route, using one of two strategies:
//!
//! - **Sequential**: one at a time, in (possibly shuffled) list order. A
//!   failing anomaly is recorded and the run continues; the caller receives
//!   every fault.
//! - **Parallel**: all at once on the calling task. Every anomaly runs to
//!   completion, then the first failure (in list order) is propagated.
//!
//! The asymmetry is intentional: sequential isolates, parallel propagates.

use crate::anomaly::Anomaly;
use crate::random::RandomSource;
use crate::registry::AnomalyRegistry;
use faultline_env::{AnomalyError, FaultContext};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Execution strategy over a route's anomaly list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Ok(ExecutionMode::Sequential),
            "parallel" | "par" | "concurrent" => Ok(ExecutionMode::Parallel),
            _ => Err(format!("Unknown execution mode: {}", s)),
        }
    }
}

/// How a transport wants a route's anomalies run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub mode: ExecutionMode,
    /// Shuffle the list before running it.
    #[serde(default)]
    pub random_order: bool,
}

impl ExecutionPlan {
    pub fn sequential() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            random_order: false,
        }
    }

    pub fn parallel() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            random_order: false,
        }
    }

    /// Same plan with shuffling switched on.
    pub fn shuffled(self) -> Self {
        Self {
            random_order: true,
            ..self
        }
    }
}

/// Runs registered anomalies around request handling.
///
/// Owns no threads; delays go through the context's timer, and parallel
/// execution is plain future composition on the caller's task.
pub struct AnomalyEngine<C: FaultContext> {
    ctx: Arc<C>,
    registry: Arc<AnomalyRegistry>,
    rng: Mutex<RandomSource>,
}

impl<C: FaultContext> AnomalyEngine<C> {
    /// Creates an engine; shuffles are seeded from the context's seed.
    pub fn new(ctx: Arc<C>, registry: Arc<AnomalyRegistry>) -> Self {
        let rng = RandomSource::from_seed(ctx.seed());
        Self::with_rng(ctx, registry, rng)
    }

    /// Creates an engine with an explicit random source.
    pub fn with_rng(ctx: Arc<C>, registry: Arc<AnomalyRegistry>, rng: RandomSource) -> Self {
        Self {
            ctx,
            registry,
            rng: Mutex::new(rng),
        }
    }

    pub fn registry(&self) -> &Arc<AnomalyRegistry> {
        &self.registry
    }

    pub fn context(&self) -> &Arc<C> {
        &self.ctx
    }

    /// Snapshot of the route's anomalies, shuffled when asked.
    fn plan_for(&self, route: &str, random_order: bool) -> Vec<Arc<Anomaly>> {
        let mut anomalies = self.registry.anomalies_for(route);
        if random_order && anomalies.len() > 1 {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.shuffle(&mut anomalies);
        }
        anomalies
    }

    /// Runs each anomaly to completion before starting the next.
    ///
    /// Failures never abort the run. Returns every fault observed, in
    /// execution order; an empty list means full success.
    pub async fn execute_sequentially(&self, route: &str, random_order: bool) -> Vec<AnomalyError> {
        let anomalies = self.plan_for(route, random_order);
        let mut errors = Vec::new();

        for anomaly in &anomalies {
            if let Err(err) = anomaly.execute(self.ctx.as_ref()).await {
                debug!(route, kind = anomaly.kind_name(), error = %err, "Anomaly failed, continuing");
                errors.push(err);
            }
        }

        debug!(route, executed = anomalies.len(), failed = errors.len(), "Sequential run complete");
        errors
    }

    /// Launches every anomaly concurrently and waits for all of them.
    ///
    /// Fails if any anomaly failed, surfacing the first failure in list
    /// order. Side effects of the other anomalies still happen.
    pub async fn execute_parallel(&self, route: &str, random_order: bool) -> Result<(), AnomalyError> {
        let anomalies = self.plan_for(route, random_order);
        let ctx = self.ctx.as_ref();

        let outcomes = join_all(anomalies.iter().map(|anomaly| anomaly.execute(ctx))).await;

        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        debug!(route, executed = anomalies.len(), failed, "Parallel run complete");

        outcomes.into_iter().collect::<Result<Vec<()>, _>>().map(|_| ())
    }

    /// Runs `route` under `plan`, folding either strategy into one result.
    ///
    /// Sequential faults are folded with [`AnomalyError::aggregate`].
    pub async fn execute(&self, route: &str, plan: ExecutionPlan) -> Result<(), AnomalyError> {
        match plan.mode {
            ExecutionMode::Sequential => {
                let errors = self.execute_sequentially(route, plan.random_order).await;
                AnomalyError::aggregate(errors)
            }
            ExecutionMode::Parallel => self.execute_parallel(route, plan.random_order).await,
        }
    }
}
