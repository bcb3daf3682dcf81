//! Scenario runner - executes fault-injection drills.

use crate::context::SimEvent;
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld};

use faultline_core::{AnomalyError, DrawMode, RandomSource, TriggerOptions, TriggerOutcome};
use faultline_env::FaultContext;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Simulated requests issued
    pub requests: usize,

    /// Virtual time consumed by injected delays
    pub virtual_time: Duration,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Injected faults observed by callers
    pub faults: u64,

    /// Requests that were suspended at least once
    pub delayed_requests: u64,

    /// Log records emitted by anomalies
    pub logs_emitted: u64,

    /// Total injected delay (ms)
    pub total_delay_ms: u64,

    /// Sample mean of the measured quantity, for statistical drills
    pub sample_mean: Option<f64>,

    /// Sample standard deviation, for statistical drills
    pub sample_std_dev: Option<f64>,
}

impl ScenarioMetrics {
    /// Counts logs and sleeps from one request's journal slice.
    fn tally(&mut self, events: &[SimEvent]) {
        let mut delayed = false;
        for event in events {
            match event {
                SimEvent::Slept { duration, .. } => {
                    delayed = true;
                    self.total_delay_ms += duration.as_millis() as u64;
                }
                SimEvent::Logged { .. } => self.logs_emitted += 1,
            }
        }
        if delayed {
            self.delayed_requests += 1;
        }
    }
}

fn moments(samples: &[f64]) -> (f64, f64) {
    let n = samples.len().max(1) as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
    (mean, var.sqrt())
}

/// Four standard errors of a proportion, plus a little slack.
fn rate_tolerance(p: f64, n: usize) -> f64 {
    4.0 * (p * (1.0 - p) / n.max(1) as f64).sqrt() + 0.005
}

type Violations = Vec<String>;

/// Runs fault-injection drills.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Simulated requests per drill
    requests: usize,

    /// Trigger draw coupling
    draw_mode: DrawMode,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            requests: 1000,
            draw_mode: DrawMode::Shared,
        }
    }

    /// Sets the number of simulated requests.
    pub fn with_requests(mut self, requests: usize) -> Self {
        self.requests = requests.max(1);
        self
    }

    /// Sets the trigger draw coupling.
    pub fn with_draw_mode(mut self, draw_mode: DrawMode) -> Self {
        self.draw_mode = draw_mode;
        self
    }

    fn world(&self) -> SimWorld {
        SimWorld::new(SimConfig {
            seed: self.seed,
            draw_mode: self.draw_mode,
            ..Default::default()
        })
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let mut world = self.world();
        let mut metrics = ScenarioMetrics::default();

        let outcome = match scenario {
            ScenarioId::WildcardFanIn => self.run_wildcard_fan_in(&mut world, &mut metrics).await,
            ScenarioId::SequentialIsolation => self.run_sequential_isolation(&mut world, &mut metrics).await,
            ScenarioId::ParallelPropagation => self.run_parallel_propagation(&mut world, &mut metrics).await,
            ScenarioId::ClearIsolation => self.run_clear_isolation(&mut world, &mut metrics).await,
            ScenarioId::DelayCalibration => self.run_delay_calibration(&mut metrics),
            ScenarioId::TriggerCalibration => self.run_trigger_calibration(&mut world, &mut metrics).await,
            ScenarioId::ShuffleFairness => self.run_shuffle_fairness(&mut world, &mut metrics).await,
        };

        let violations = match outcome {
            Ok(violations) => violations,
            Err(err) => vec![format!("Drill setup failed: {}", err)],
        };

        let failure_reason = match violations.len() {
            0 => None,
            1 => Some(violations[0].clone()),
            n => Some(format!("{} (and {} more)", violations[0], n - 1)),
        };

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: violations.is_empty(),
            requests: self.requests,
            virtual_time: world.context.now(),
            failure_reason,
            metrics,
        }
    }

    // =========================================================================
    // REGISTRY DRILLS
    // =========================================================================

    /// DRL-001: a wildcard log precedes a route-specific delay on every request.
    async fn run_wildcard_fan_in(
        &self,
        world: &mut SimWorld,
        metrics: &mut ScenarioMetrics,
    ) -> Result<Violations, AnomalyError> {
        world.register_json(r#"{"kind":"LOG","route":"*","logLevel":"Information","message":"fan-in"}"#)?;
        world.register_json(r#"{"kind":"DELAY","route":"/orders","delayMs":5}"#)?;

        let mut violations = Vec::new();
        for _ in 0..self.requests {
            let route = world.next_route();
            let mark = world.context.journal_len();
            let errors = world.engine.execute_sequentially(&route, false).await;
            let events = world.context.events_since(mark);

            metrics.faults += errors.len() as u64;
            metrics.tally(&events);

            match events.first() {
                Some(SimEvent::Logged { route: r, message, .. }) if r == "*" && message == "fan-in" => {}
                other => violations.push(format!("{}: expected wildcard log first, saw {:?}", route, other)),
            }

            let expected = if route == "/orders" { 2 } else { 1 };
            if events.len() != expected {
                violations.push(format!("{}: expected {} effects, saw {}", route, expected, events.len()));
            }
        }

        info!("✓ WildcardFanIn: {} logs, {} delayed requests", metrics.logs_emitted, metrics.delayed_requests);
        Ok(violations)
    }

    /// DRL-002: faults are collected, later anomalies still run.
    async fn run_sequential_isolation(
        &self,
        world: &mut SimWorld,
        metrics: &mut ScenarioMetrics,
    ) -> Result<Violations, AnomalyError> {
        world.register_json(r#"{"kind":"EXCEPTION","route":"/orders"}"#)?;
        world.register_json(r#"{"kind":"LOG","route":"/orders","logLevel":"Error","message":"after-exception"}"#)?;
        world.register_json(r#"{"kind":"EXCEPTION","route":"/orders"}"#)?;
        world.register_json(r#"{"kind":"DELAY","route":"/orders","delayMs":10}"#)?;

        let mut violations = Vec::new();
        for _ in 0..self.requests {
            let mark = world.context.journal_len();
            let errors = world.engine.execute_sequentially("/orders", false).await;
            let events = world.context.events_since(mark);

            metrics.faults += errors.len() as u64;
            metrics.tally(&events);

            if errors.len() != 2 || !errors.iter().all(|e| e.is_anomalous()) {
                violations.push(format!("expected 2 injected faults, got {:?}", errors));
            }

            let expected = vec![
                SimEvent::Logged {
                    at: events.first().map(event_time).unwrap_or_default(),
                    level: faultline_env::LogLevel::Error,
                    route: "/orders".to_string(),
                    message: "after-exception".to_string(),
                },
                SimEvent::Slept {
                    at: events.get(1).map(event_time).unwrap_or_default(),
                    duration: Duration::from_millis(10),
                },
            ];
            if events != expected {
                violations.push(format!("unexpected side effects {:?}", events));
            }
        }

        info!("✓ SequentialIsolation: {} faults collected, {} logs", metrics.faults, metrics.logs_emitted);
        Ok(violations)
    }

    /// DRL-003: the parallel call fails, yet the delay and the log happened.
    async fn run_parallel_propagation(
        &self,
        world: &mut SimWorld,
        metrics: &mut ScenarioMetrics,
    ) -> Result<Violations, AnomalyError> {
        world.register_json(r#"{"kind":"DELAY","route":"/orders","delayMs":20}"#)?;
        world.register_json(r#"{"kind":"EXCEPTION","route":"/orders"}"#)?;
        world.register_json(r#"{"kind":"LOG","route":"/orders","logLevel":"Warning","message":"parallel-log"}"#)?;

        let mut violations = Vec::new();
        for _ in 0..self.requests {
            let route = world.next_route();
            let mark = world.context.journal_len();
            let result = world.engine.execute_parallel(&route, true).await;
            let events = world.context.events_since(mark);

            metrics.tally(&events);

            if route == "/orders" {
                match result {
                    Err(err) if err.is_anomalous() => metrics.faults += 1,
                    other => violations.push(format!("/orders: expected injected fault, got {:?}", other)),
                }

                let slept = events.iter().any(|e| {
                    matches!(e, SimEvent::Slept { duration, .. } if *duration == Duration::from_millis(20))
                });
                let logged = events
                    .iter()
                    .any(|e| matches!(e, SimEvent::Logged { message, .. } if message == "parallel-log"));
                if !slept || !logged || events.len() != 2 {
                    violations.push(format!("/orders: side effects missing, saw {:?}", events));
                }
            } else if result.is_err() || !events.is_empty() {
                violations.push(format!("{}: expected untouched request, got {:?} / {:?}", route, result, events));
            }
        }

        info!("✓ ParallelPropagation: {} propagated faults", metrics.faults);
        Ok(violations)
    }

    /// DRL-004: clear removes exactly one bucket.
    async fn run_clear_isolation(
        &self,
        world: &mut SimWorld,
        metrics: &mut ScenarioMetrics,
    ) -> Result<Violations, AnomalyError> {
        let mut violations = Vec::new();

        // Register then clear leaves nothing behind
        world.register_json(r#"{"kind":"EXCEPTION","route":"/orders"}"#)?;
        world.registry.clear_anomalies("/orders");
        if !world.registry.anomalies_for("/orders").is_empty() {
            violations.push("register-then-clear left anomalies behind".to_string());
        }

        world.register_json(r#"{"kind":"EXCEPTION","route":"*"}"#)?;
        world.register_json(r#"{"kind":"EXCEPTION","route":"/orders"}"#)?;

        if world.registry.clear_anomalies("/orders") != 1 {
            violations.push("clearing /orders did not remove exactly one anomaly".to_string());
        }
        if world.registry.clear_anomalies("/never-registered") != 0 || world.registry.len() != 1 {
            violations.push("clearing an unknown route changed the registry".to_string());
        }

        // Only the wildcard fault remains
        for _ in 0..self.requests {
            let route = world.next_route();
            let errors = world.engine.execute_sequentially(&route, false).await;
            metrics.faults += errors.len() as u64;
            if errors.len() != 1 {
                violations.push(format!("{}: expected wildcard fault only, got {:?}", route, errors));
            }
        }

        world.registry.clear_anomalies("*");
        for _ in 0..self.requests {
            let route = world.next_route();
            let errors = world.engine.execute_sequentially(&route, false).await;
            if !errors.is_empty() {
                violations.push(format!("{}: faults after clearing everything: {:?}", route, errors));
            }
        }

        info!("✓ ClearIsolation: {} wildcard faults before final clear", metrics.faults);
        Ok(violations)
    }

    // =========================================================================
    // STATISTICAL DRILLS
    // =========================================================================

    /// DRL-005: sample moments of N(300, 120).
    fn run_delay_calibration(&self, metrics: &mut ScenarioMetrics) -> Result<Violations, AnomalyError> {
        const MEAN: f64 = 300.0;
        const STD_DEV: f64 = 120.0;

        let n = self.requests.max(2);
        let mut rng = RandomSource::seeded(self.seed);
        let samples: Vec<f64> = (0..n).map(|_| rng.next_gaussian(MEAN, STD_DEV)).collect();
        let (mean, std_dev) = moments(&samples);

        metrics.sample_mean = Some(mean);
        metrics.sample_std_dev = Some(std_dev);

        let mean_tolerance = 4.0 * STD_DEV / (n as f64).sqrt();
        let std_tolerance = 4.0 * STD_DEV / (2.0 * n as f64).sqrt() + 1.0;

        let mut violations = Vec::new();
        if (mean - MEAN).abs() > mean_tolerance {
            violations.push(format!("sample mean {:.2} outside {:.0} ± {:.2}", mean, MEAN, mean_tolerance));
        }
        if (std_dev - STD_DEV).abs() > std_tolerance {
            violations.push(format!(
                "sample std dev {:.2} outside {:.0} ± {:.2}",
                std_dev, STD_DEV, std_tolerance
            ));
        }

        info!("✓ DelayCalibration: mean={:.2} std_dev={:.2} over {} samples", mean, std_dev, n);
        Ok(violations)
    }

    /// DRL-006: observed fault and delay rates under the trigger policy.
    async fn run_trigger_calibration(
        &self,
        world: &mut SimWorld,
        metrics: &mut ScenarioMetrics,
    ) -> Result<Violations, AnomalyError> {
        let options = TriggerOptions {
            cause_exception: true,
            target_delay_ms: 300,
            exception_rate: 0.1,
            delay_rate: 0.5,
        };
        world.policy.update_options(options.clone())?;

        let n = self.requests;
        let mut delays = Vec::new();
        for _ in 0..n {
            match world.policy.trigger().await {
                Err(_) => metrics.faults += 1,
                Ok(TriggerOutcome::Delayed(delay)) => {
                    metrics.delayed_requests += 1;
                    metrics.total_delay_ms += delay.as_millis() as u64;
                    delays.push(delay.as_millis() as f64);
                }
                Ok(TriggerOutcome::Passed) => {}
            }
        }

        let fault_rate = metrics.faults as f64 / n as f64;
        let delay_rate = metrics.delayed_requests as f64 / n as f64;

        // One shared draw delays r in (exceptionRate, delayRate]
        let expected_delay_rate = match world.policy.draw_mode() {
            DrawMode::Shared => options.delay_rate - options.exception_rate,
            DrawMode::Independent => (1.0 - options.exception_rate) * options.delay_rate,
        };

        let mut violations = Vec::new();
        if (fault_rate - options.exception_rate).abs() > rate_tolerance(options.exception_rate, n) {
            violations.push(format!("fault rate {:.4}, expected {:.2}", fault_rate, options.exception_rate));
        }
        if (delay_rate - expected_delay_rate).abs() > rate_tolerance(expected_delay_rate, n) {
            violations.push(format!("delay rate {:.4}, expected {:.2}", delay_rate, expected_delay_rate));
        }

        if !delays.is_empty() {
            let (mean, std_dev) = moments(&delays);
            metrics.sample_mean = Some(mean);
            metrics.sample_std_dev = Some(std_dev);

            let tolerance = 4.0 * options.std_dev_ms() / (delays.len() as f64).sqrt() + 1.0;
            if (mean - options.target_delay_ms as f64).abs() > tolerance {
                violations.push(format!("mean delay {:.2}ms, expected {}ms", mean, options.target_delay_ms));
            }
        }

        let slept = world.context.total_slept().as_millis() as u64;
        if slept != metrics.total_delay_ms {
            violations.push(format!("clock slept {}ms, policy reported {}ms", slept, metrics.total_delay_ms));
        }

        info!(
            "✓ TriggerCalibration: fault_rate={:.3} delay_rate={:.3} ({:?} draws)",
            fault_rate,
            delay_rate,
            world.policy.draw_mode()
        );
        Ok(violations)
    }

    /// DRL-007: each of three anomalies leads a third of shuffled runs.
    async fn run_shuffle_fairness(
        &self,
        world: &mut SimWorld,
        metrics: &mut ScenarioMetrics,
    ) -> Result<Violations, AnomalyError> {
        let labels = ["a", "b", "c"];
        for label in labels {
            world.register_json(&format!(
                r#"{{"kind":"LOG","route":"/orders","logLevel":"Debug","message":"{}"}}"#,
                label
            ))?;
        }

        let n = self.requests;
        let mut leads = [0usize; 3];
        let mut violations = Vec::new();

        for _ in 0..n {
            let mark = world.context.journal_len();
            world.engine.execute_sequentially("/orders", true).await;
            let events = world.context.events_since(mark);
            metrics.tally(&events);

            let mut messages: Vec<&str> = events
                .iter()
                .filter_map(|e| match e {
                    SimEvent::Logged { message, .. } => Some(message.as_str()),
                    SimEvent::Slept { .. } => None,
                })
                .collect();

            if let Some(idx) = messages.first().and_then(|m| labels.iter().position(|l| l == m)) {
                leads[idx] += 1;
            }

            messages.sort_unstable();
            if messages != labels {
                violations.push(format!("shuffled run was not a permutation: {:?}", messages));
            }
        }

        let expected = 1.0 / 3.0;
        for (label, count) in labels.iter().zip(leads.iter()) {
            let share = *count as f64 / n as f64;
            if (share - expected).abs() > rate_tolerance(expected, n) {
                violations.push(format!("'{}' led {:.3} of runs, expected {:.3}", label, share, expected));
            }
        }

        info!("✓ ShuffleFairness: leads a={} b={} c={}", leads[0], leads[1], leads[2]);
        Ok(violations)
    }
}

fn event_time(event: &SimEvent) -> Duration {
    match event {
        SimEvent::Slept { at, .. } | SimEvent::Logged { at, .. } => *at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_scenarios_pass_default_seed() {
        let runner = ScenarioRunner::new(42).with_requests(500);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario).await;
            assert!(result.passed, "{} failed: {:?}", scenario, result.failure_reason);
        }
    }

    #[tokio::test]
    async fn test_independent_draws_pass() {
        let runner = ScenarioRunner::new(7)
            .with_requests(2000)
            .with_draw_mode(DrawMode::Independent);
        let result = runner.run(ScenarioId::TriggerCalibration).await;
        assert!(result.passed, "{:?}", result.failure_reason);
    }

    #[tokio::test]
    async fn test_results_are_reproducible() {
        let a = ScenarioRunner::new(99).with_requests(300).run(ScenarioId::TriggerCalibration).await;
        let b = ScenarioRunner::new(99).with_requests(300).run(ScenarioId::TriggerCalibration).await;

        assert_eq!(a.metrics.faults, b.metrics.faults);
        assert_eq!(a.metrics.total_delay_ms, b.metrics.total_delay_ms);
        assert_eq!(a.virtual_time, b.virtual_time);
    }

    #[tokio::test]
    async fn test_parallel_drill_counts_faults() {
        let result = ScenarioRunner::new(3).with_requests(200).run(ScenarioId::ParallelPropagation).await;
        assert!(result.passed);
        assert!(result.metrics.faults > 0);
        assert_eq!(result.metrics.faults, result.metrics.logs_emitted);
    }

    #[test]
    fn test_rate_tolerance_shrinks() {
        assert!(rate_tolerance(0.5, 10_000) < rate_tolerance(0.5, 100));
    }
}
