//! Core environment context trait for anomaly execution.

use crate::types::LogLevel;
use async_trait::async_trait;
use std::time::Duration;

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that injected anomalies can run
/// in both production (tokio) and simulation (virtual clock) environments.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, `tracing`
/// - **Simulation**: `SimContext` - virtual clock plus an event journal
///
/// # Determinism
///
/// For drills, every method that would normally introduce non-determinism
/// (time, entropy) is controlled by the implementation.
#[async_trait]
pub trait FaultContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    ///
    /// Dropping the returned future aborts the suspension.
    async fn sleep(&self, duration: Duration);

    /// Emits a diagnostic record on behalf of `route`.
    ///
    /// Never fails. `LogLevel::None` is accepted and discarded.
    fn emit_log(&self, level: LogLevel, route: &str, message: &str);

    /// Returns the context's master seed.
    ///
    /// `None` means randomness should come from system entropy.
    fn seed(&self) -> Option<u64>;
}
