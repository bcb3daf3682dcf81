//! Faultline Deterministic Drill Harness
//!
//! Runs the anomaly registry, execution engine and trigger policy against a
//! virtual clock so fault-injection behavior can be asserted exactly.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: injected delays advance a virtual clock instantly
//! - **Side effects**: every sleep and log record lands in a journal
//! - **Randomness**: all entropy derived from a single 64-bit seed
//!
//! # Usage
//!
//! ```ignore
//! use faultline_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42).with_requests(1000);
//! let result = runner.run(ScenarioId::TriggerCalibration).await;
//! assert!(result.passed);
//! ```

mod context;
mod runner;
mod world;

pub mod scenarios;

pub use context::{SimContext, SimEvent};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use world::{SimConfig, SimWorld};
