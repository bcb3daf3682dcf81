//! Faultline daemon
//!
//! Serves the fault-injection HTTP boundary.

use clap::Parser;
use faultline_api::error::{ServiceError, ServiceResult};
use faultline_api::{Design, Server, ServiceConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Faultline daemon CLI
#[derive(Parser)]
#[command(name = "faultlined")]
#[command(about = "Faultline - fault-injection service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FAULTLINE_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "FAULTLINE_LISTEN_ADDR")]
    listen: Option<String>,

    /// Anomaly design (registry, probabilistic)
    #[arg(short, long, env = "FAULTLINE_DESIGN")]
    design: Option<Design>,

    /// Log level
    #[arg(long, env = "FAULTLINE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "FAULTLINE_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> ServiceResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config =
        ServiceConfig::load(cli.config.as_deref()).map_err(|e| ServiceError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| ServiceError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(design) = cli.design {
        config.engine.design = design;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    println!(
        r#"
  Faultline - anomaly injection service
  Version: {}
  Design: {:?}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.engine.design,
        config.server.listen_addr
    );

    Server::new(config).run().await
}
