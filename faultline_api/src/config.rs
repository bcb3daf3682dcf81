//! Configuration for the Faultline service

use faultline_core::{DrawMode, ExecutionMode, ExecutionPlan};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Anomaly engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Probabilistic trigger configuration
    #[serde(default)]
    pub trigger: TriggerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Which fault-injection design backs `/api/Anomaly` and the workload routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Design {
    /// Per-route anomalies kept in the registry.
    #[default]
    Registry,
    /// Global options applied by the trigger policy.
    Probabilistic,
}

impl std::str::FromStr for Design {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "registry" => Ok(Design::Registry),
            "probabilistic" | "trigger" | "options" => Ok(Design::Probabilistic),
            _ => Err(format!("Unknown design: {}", s)),
        }
    }
}

/// Anomaly engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub design: Design,

    /// How a route's anomalies run
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Shuffle anomalies before each run
    #[serde(default)]
    pub random_order: bool,

    /// Fixed seed for the engine and trigger random sources
    #[serde(default)]
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn plan(&self) -> ExecutionPlan {
        ExecutionPlan {
            mode: self.mode,
            random_order: self.random_order,
        }
    }
}

/// Probabilistic trigger configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Whether the exception and delay checks share a draw
    #[serde(default)]
    pub draw_mode: DrawMode,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `FAULTLINE_`-prefixed environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `FAULTLINE_ENGINE__DESIGN`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ServiceConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FAULTLINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
