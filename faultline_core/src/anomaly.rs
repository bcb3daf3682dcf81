//! The polymorphic unit of injected behavior.
//!
//! An [`Anomaly`] is a closed set of three behaviors bound to one route key:
//!
//! | Kind        | Execute                                   | Suspends | Fails |
//! |-------------|-------------------------------------------|----------|-------|
//! | `Delay`     | sleeps for exactly `duration`             | yes      | no    |
//! | `Exception` | returns [`AnomalyError::Anomalous`]       | no       | yes   |
//! | `Log`       | emits one record at `level`               | no       | no    |
//!
//! Anomalies are immutable once constructed; changing behavior means
//! clearing the route and registering a new one.

use faultline_env::{AnomalyError, FaultContext, LogLevel};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// What an anomaly does when executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// Suspends the caller, never fails.
    Delay {
        #[serde(rename = "delayMs", serialize_with = "serialize_millis")]
        duration: Duration,
    },

    /// Always fails with an injected fault.
    Exception,

    /// Emits a log record synchronously, never fails.
    Log {
        #[serde(rename = "logLevel")]
        level: LogLevel,
        message: String,
    },
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// A registered anomaly.
///
/// Serializes in the same `kind`-tagged shape as the registration payload,
/// plus its `id`, so listings can be fed back into registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    id: Uuid,
    route: String,
    #[serde(flatten)]
    kind: AnomalyKind,
}

impl Anomaly {
    /// Creates an anomaly of any kind for `route`.
    pub fn new(route: impl Into<String>, kind: AnomalyKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            route: route.into(),
            kind,
        }
    }

    /// Delay anomaly.
    pub fn delay(route: impl Into<String>, duration: Duration) -> Self {
        Self::new(route, AnomalyKind::Delay { duration })
    }

    /// Exception anomaly.
    pub fn exception(route: impl Into<String>) -> Self {
        Self::new(route, AnomalyKind::Exception)
    }

    /// Log anomaly.
    pub fn log(route: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(
            route,
            AnomalyKind::Log {
                level,
                message: message.into(),
            },
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The owning route key, or `*`.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn kind(&self) -> &AnomalyKind {
        &self.kind
    }

    /// Short name of the kind, as used on the wire.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            AnomalyKind::Delay { .. } => "DELAY",
            AnomalyKind::Exception => "EXCEPTION",
            AnomalyKind::Log { .. } => "LOG",
        }
    }

    /// Runs the injected behavior.
    ///
    /// Only `Delay` suspends; cancelling the returned future aborts the
    /// suspension.
    pub async fn execute<C: FaultContext + ?Sized>(&self, ctx: &C) -> Result<(), AnomalyError> {
        match &self.kind {
            AnomalyKind::Delay { duration } => {
                ctx.sleep(*duration).await;
                Ok(())
            }
            AnomalyKind::Exception => Err(AnomalyError::anomalous(self.route.clone())),
            AnomalyKind::Log { level, message } => {
                ctx.emit_log(*level, &self.route, message);
                Ok(())
            }
        }
    }
}
