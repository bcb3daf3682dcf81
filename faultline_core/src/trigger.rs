//! Probabilistic Trigger Policy.
//!
//! The route-agnostic alternative to the registry: one set of global
//! options decides, per request, whether to fail and/or how long to stall.
//!
//! # Decision procedure
//!
//! ```text
//! r = uniform[0,1)
//! if r <= exceptionRate && causeException      -> fail, no delay
//! else if r' <= delayRate && targetDelayMs > 0  -> sleep floor(max(0, N(target, 0.4·target))) ms
//! ```
//!
//! With [`DrawMode::Shared`] (the default) `r' = r`: the two rates are
//! coupled through one draw. [`DrawMode::Independent`] draws `r'` afresh.

use crate::random::RandomSource;
use faultline_env::{AnomalyError, FaultContext, ALL_ROUTES_KEYWORD};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info};

/// Ratio of the Gaussian standard deviation to the target delay.
pub const STD_DEV_RATIO: f64 = 0.4;

/// Global trigger options. The default (all zero) disables every anomaly.
///
/// Serializes with the derived `stdDevMs` alongside the stored fields; that
/// key is ignored when deserializing.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerOptions {
    pub cause_exception: bool,
    pub target_delay_ms: u64,
    /// Probability in [0, 1].
    pub exception_rate: f64,
    /// Probability in [0, 1].
    pub delay_rate: f64,
}

impl TriggerOptions {
    /// Standard deviation of the Gaussian delay, derived from the target.
    pub fn std_dev_ms(&self) -> f64 {
        self.target_delay_ms as f64 * STD_DEV_RATIO
    }

    /// True if no request can ever be affected.
    pub fn is_disabled(&self) -> bool {
        let exceptions = self.cause_exception && self.exception_rate > 0.0;
        let delays = self.target_delay_ms > 0 && self.delay_rate > 0.0;
        !exceptions && !delays
    }

    /// Checks both rates lie in [0, 1].
    pub fn validate(&self) -> Result<(), AnomalyError> {
        for (name, rate) in [("exceptionRate", self.exception_rate), ("delayRate", self.delay_rate)] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(AnomalyError::InvalidOptions(format!(
                    "{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerOptionsView {
    cause_exception: bool,
    target_delay_ms: u64,
    std_dev_ms: f64,
    exception_rate: f64,
    delay_rate: f64,
}

impl Serialize for TriggerOptions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TriggerOptionsView {
            cause_exception: self.cause_exception,
            target_delay_ms: self.target_delay_ms,
            std_dev_ms: self.std_dev_ms(),
            exception_rate: self.exception_rate,
            delay_rate: self.delay_rate,
        }
        .serialize(serializer)
    }
}

/// Whether the exception and delay checks share one uniform draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// One draw feeds both checks.
    #[default]
    Shared,
    /// The delay check gets its own draw.
    Independent,
}

impl std::str::FromStr for DrawMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shared" | "coupled" => Ok(DrawMode::Shared),
            "independent" | "separate" => Ok(DrawMode::Independent),
            _ => Err(format!("Unknown draw mode: {}", s)),
        }
    }
}

/// Outcome of one trigger call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Nothing fired.
    Passed,
    /// The caller was suspended for this long.
    Delayed(Duration),
}

/// Per-request fault decision over replaceable global options.
///
/// Options are swapped wholesale behind an `Arc`; a trigger call reads one
/// consistent snapshot.
pub struct TriggerPolicy<C: FaultContext> {
    ctx: Arc<C>,
    options: RwLock<Arc<TriggerOptions>>,
    rng: Mutex<RandomSource>,
    draw_mode: DrawMode,
}

impl<C: FaultContext> TriggerPolicy<C> {
    /// Creates a disabled policy seeded from the context.
    pub fn new(ctx: Arc<C>) -> Self {
        let rng = RandomSource::from_seed(ctx.seed());
        Self::with_rng(ctx, rng)
    }

    /// Creates a disabled policy with an explicit random source.
    pub fn with_rng(ctx: Arc<C>, rng: RandomSource) -> Self {
        Self {
            ctx,
            options: RwLock::new(Arc::new(TriggerOptions::default())),
            rng: Mutex::new(rng),
            draw_mode: DrawMode::default(),
        }
    }

    /// Sets how the delay check draws its random value.
    pub fn with_draw_mode(mut self, draw_mode: DrawMode) -> Self {
        self.draw_mode = draw_mode;
        self
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Current options snapshot.
    pub fn options(&self) -> Arc<TriggerOptions> {
        Arc::clone(&self.options.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the options atomically. Invalid options leave the current
    /// ones in place.
    pub fn update_options(&self, options: TriggerOptions) -> Result<(), AnomalyError> {
        options.validate()?;

        info!(
            cause_exception = options.cause_exception,
            target_delay_ms = options.target_delay_ms,
            exception_rate = options.exception_rate,
            delay_rate = options.delay_rate,
            "Updated anomaly options"
        );

        *self.options.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(options);
        Ok(())
    }

    /// Resets to the all-zero default.
    pub fn disable(&self) {
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(TriggerOptions::default());
        info!("Disabled anomaly options");
    }

    /// Draws the decision for one request without suspending.
    ///
    /// Returns the delay to apply, or the injected fault.
    fn decide(&self, options: &TriggerOptions) -> Result<Option<Duration>, AnomalyError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let r = rng.next_uniform();

        if r <= options.exception_rate && options.cause_exception {
            return Err(AnomalyError::anomalous(ALL_ROUTES_KEYWORD));
        }

        let r_delay = match self.draw_mode {
            DrawMode::Shared => r,
            DrawMode::Independent => rng.next_uniform(),
        };

        if r_delay <= options.delay_rate && options.target_delay_ms > 0 {
            let sample = rng.next_gaussian(options.target_delay_ms as f64, options.std_dev_ms());
            let millis = sample.max(0.0).floor() as u64;
            return Ok(Some(Duration::from_millis(millis)));
        }

        Ok(None)
    }

    /// Applies the policy to one inbound request.
    pub async fn trigger(&self) -> Result<TriggerOutcome, AnomalyError> {
        let options = self.options();
        if options.is_disabled() {
            return Ok(TriggerOutcome::Passed);
        }

        match self.decide(&options)? {
            Some(delay) => {
                debug!(delay_ms = delay.as_millis() as u64, "Trigger delaying request");
                self.ctx.sleep(delay).await;
                Ok(TriggerOutcome::Delayed(delay))
            }
            None => Ok(TriggerOutcome::Passed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_env::TokioContext;

    fn policy(seed: u64) -> TriggerPolicy<TokioContext> {
        TriggerPolicy::with_rng(Arc::new(TokioContext::new()), RandomSource::seeded(seed))
    }

    #[test]
    fn test_default_options_disabled() {
        let options = TriggerOptions::default();
        assert!(options.is_disabled());
        assert_eq!(options.std_dev_ms(), 0.0);
    }

    #[test]
    fn test_std_dev_derived() {
        let options = TriggerOptions {
            target_delay_ms: 300,
            ..Default::default()
        };
        assert!((options.std_dev_ms() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_wire_format() {
        let options: TriggerOptions = serde_json::from_str(
            r#"{"causeException":true,"targetDelayMs":300,"exceptionRate":0.1,"delayRate":0.5}"#,
        )
        .unwrap();

        assert!(options.cause_exception);
        assert_eq!(options.target_delay_ms, 300);

        let partial: TriggerOptions = serde_json::from_str(r#"{"delayRate":1.0}"#).unwrap();
        assert_eq!(partial.target_delay_ms, 0);
        assert_eq!(partial.delay_rate, 1.0);
    }

    #[test]
    fn test_serialized_options_carry_std_dev() {
        let options = TriggerOptions {
            cause_exception: true,
            target_delay_ms: 300,
            exception_rate: 0.1,
            delay_rate: 0.5,
        };

        let json = serde_json::to_value(&options).unwrap();
        assert!((json["stdDevMs"].as_f64().unwrap() - 120.0).abs() < 1e-9);
        assert_eq!(json["targetDelayMs"], 300);

        // Posting a listing back ignores the derived field
        let back: TriggerOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_draw_mode_from_str() {
        assert_eq!("Independent".parse::<DrawMode>().unwrap(), DrawMode::Independent);
        assert_eq!("shared".parse::<DrawMode>().unwrap(), DrawMode::Shared);
        assert!("both".parse::<DrawMode>().is_err());
    }

    #[test]
    fn test_invalid_rates_rejected_atomically() {
        let policy = policy(1);
        let good = TriggerOptions {
            cause_exception: true,
            exception_rate: 0.5,
            ..Default::default()
        };
        policy.update_options(good.clone()).unwrap();

        let bad = TriggerOptions {
            delay_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(policy.update_options(bad), Err(AnomalyError::InvalidOptions(_))));
        assert_eq!(*policy.options(), good);
    }

    #[test]
    fn test_disable_resets() {
        let policy = policy(1);
        policy
            .update_options(TriggerOptions {
                cause_exception: true,
                exception_rate: 1.0,
                ..Default::default()
            })
            .unwrap();

        policy.disable();
        assert_eq!(*policy.options(), TriggerOptions::default());
    }

    #[tokio::test]
    async fn test_disabled_policy_passes() {
        let policy = policy(1);
        for _ in 0..100 {
            assert_eq!(policy.trigger().await.unwrap(), TriggerOutcome::Passed);
        }
    }

    #[tokio::test]
    async fn test_certain_exception_skips_delay() {
        let policy = policy(2);
        policy
            .update_options(TriggerOptions {
                cause_exception: true,
                exception_rate: 1.0,
                target_delay_ms: 10_000,
                delay_rate: 1.0,
            })
            .unwrap();

        let start = std::time::Instant::now();
        let err = policy.trigger().await.unwrap_err();

        assert!(err.is_anomalous());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rate_without_flag_never_fails() {
        let policy = policy(3);
        policy
            .update_options(TriggerOptions {
                cause_exception: false,
                exception_rate: 1.0,
                ..Default::default()
            })
            .unwrap();

        for _ in 0..50 {
            assert!(policy.trigger().await.is_ok());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_certain_delay_applies() {
        let policy = policy(4);
        policy
            .update_options(TriggerOptions {
                target_delay_ms: 300,
                delay_rate: 1.0,
                ..Default::default()
            })
            .unwrap();

        let mut delayed = 0;
        for _ in 0..20 {
            if let TriggerOutcome::Delayed(_) = policy.trigger().await.unwrap() {
                delayed += 1;
            }
        }
        assert_eq!(delayed, 20);
    }

    #[test]
    fn test_shared_draw_couples_rates() {
        // exceptionRate 0.3 / delayRate 0.6 with one draw: a delayed request
        // had r in (0.3, 0.6], so 0.3 of requests are delayed, not 0.42
        let policy = policy(5);
        let options = TriggerOptions {
            cause_exception: true,
            exception_rate: 0.3,
            target_delay_ms: 100,
            delay_rate: 0.6,
        };

        let trials = 20_000;
        let mut failed = 0;
        let mut delayed = 0;
        for _ in 0..trials {
            match policy.decide(&options) {
                Err(_) => failed += 1,
                Ok(Some(_)) => delayed += 1,
                Ok(None) => {}
            }
        }

        let fail_rate = failed as f64 / trials as f64;
        let delay_rate = delayed as f64 / trials as f64;
        assert!((fail_rate - 0.3).abs() < 0.02);
        assert!((delay_rate - 0.3).abs() < 0.02);
    }

    #[test]
    fn test_independent_draw_decouples_rates() {
        let policy = policy(5).with_draw_mode(DrawMode::Independent);
        let options = TriggerOptions {
            cause_exception: true,
            exception_rate: 0.3,
            target_delay_ms: 100,
            delay_rate: 0.6,
        };

        let trials = 20_000;
        let mut delayed = 0;
        for _ in 0..trials {
            if let Ok(Some(_)) = policy.decide(&options) {
                delayed += 1;
            }
        }

        // 0.7 survive the exception check, 0.6 of those are delayed
        let delay_rate = delayed as f64 / trials as f64;
        assert!((delay_rate - 0.42).abs() < 0.02);
    }

    #[test]
    fn test_gaussian_delay_never_negative() {
        let policy = policy(6);
        let options = TriggerOptions {
            target_delay_ms: 1,
            delay_rate: 1.0,
            ..Default::default()
        };

        for _ in 0..5_000 {
            let delay = policy.decide(&options).unwrap().unwrap();
            assert!(delay <= Duration::from_millis(10));
        }
    }
}
