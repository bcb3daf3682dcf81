//! Common types shared by the registry, the engine and the wire format.

use serde::{Deserialize, Serialize};

/// Route key meaning "applies to every route".
///
/// Reserved; must not collide with a real application route.
pub const ALL_ROUTES_KEYWORD: &str = "*";

/// Returns true if `route` is the wildcard bucket key.
pub fn is_wildcard(route: &str) -> bool {
    route == ALL_ROUTES_KEYWORD
}

/// Severity of a record emitted by a Log anomaly.
///
/// Variant names match the registration payloads produced by the dashboard
/// (`"Information"`, `"Warning"`, ...); the usual short spellings are
/// accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(alias = "trace", alias = "TRACE")]
    Trace,
    #[serde(alias = "debug", alias = "DEBUG")]
    Debug,
    #[default]
    #[serde(alias = "info", alias = "INFO", alias = "information")]
    Information,
    #[serde(alias = "warn", alias = "WARN", alias = "warning")]
    Warning,
    #[serde(alias = "error", alias = "ERROR")]
    Error,
    #[serde(alias = "critical", alias = "CRITICAL", alias = "fatal")]
    Critical,
    #[serde(alias = "none", alias = "off")]
    None,
}

impl LogLevel {
    /// Maps onto a `tracing` level. `Critical` folds into `ERROR`;
    /// `None` has no counterpart and returns `None`.
    pub fn as_tracing(&self) -> Option<tracing::Level> {
        match self {
            LogLevel::Trace => Some(tracing::Level::TRACE),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Information => Some(tracing::Level::INFO),
            LogLevel::Warning => Some(tracing::Level::WARN),
            LogLevel::Error | LogLevel::Critical => Some(tracing::Level::ERROR),
            LogLevel::None => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Critical => "Critical",
            LogLevel::None => "None",
        };
        write!(f, "{}", name)
    }
}
