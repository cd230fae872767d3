//! Parameter sweep engine for paired correlation grids
//!
//! This crate evaluates a correlation model over every unordered pair of varying
//! parameters and memoizes the per-pair results on disk. It supports:
//! - Pair enumeration with repetition over the varying parameter names
//! - 2-D metric grids per pair, collapsing to the 1-D diagonal when both names match
//! - Numerator, denominator, and ratio metrics with NaN-aware division
//! - A bounded worker pool sized to the machine by default
//! - Durable memoization with keyed part files and a subsuming aggregate file
//! - Symmetric name-indexed lookup tables over the finished sweep
//!
//! # Running a sweep
//!
//! ```ignore
//! use std::path::Path;
//!
//! use syncfrac::{
//!     Metric, PairEvaluator, Suppression, SweepCache, SweepConfig, SweepOrchestrator,
//! };
//!
//! let config = SweepConfig::load(Path::new("sweep.json"))?;
//! let evaluator = PairEvaluator::new(model, Suppression::parasitoid_synchrony());
//! let orchestrator = SweepOrchestrator::new(
//!     SweepCache::new("out/run7"),
//!     config.settings.workers,
//! );
//! let result = orchestrator.run(&config.space, &evaluator)?;
//! let ratio = result.get_by_name(Metric::Ratio, "Shh", "mh");
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod cache;
pub mod error;
pub mod evaluate;
pub mod reduce;
pub mod sweep;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use cache::SweepCache;
pub use config::SweepConfig;
pub use error::{Result, SweepError};
pub use evaluate::{CorrelationModel, PairEvaluator, Suppression};
pub use model::Metric;
pub use reduce::SweepResult;
pub use sweep::SweepOrchestrator;
