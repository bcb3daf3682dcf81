//! Faultline Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the anomaly engine
//! to run in both **Production** (tokio) and **Simulation** (virtual clock)
//! environments.
//!
//! # Core Concept: Intercept Every Side Effect
//!
//! An injected anomaly only ever does one of three things to the world:
//! - Suspends the caller (`sleep()`)
//! - Emits a diagnostic record (`emit_log()`)
//! - Fails with an [`AnomalyError`]
//!
//! The first two go through [`FaultContext`], so a drill can replay the exact
//! same request stream against a virtual clock and inspect what happened.
//! Randomness is seeded from [`FaultContext::seed`]; any statistical surprise
//! becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use faultline_env::{FaultContext, LogLevel};
//!
//! async fn slow_path<Ctx: FaultContext>(ctx: &Ctx) {
//!     ctx.emit_log(LogLevel::Warning, "/orders", "about to stall");
//!     ctx.sleep(Duration::from_millis(250)).await;
//! }
//! ```

mod context;
mod types;
mod error;
mod tokio_impl;

pub use context::FaultContext;
pub use types::{is_wildcard, LogLevel, ALL_ROUTES_KEYWORD};
pub use error::AnomalyError;
pub use tokio_impl::TokioContext;
