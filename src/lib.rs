//! Adalyze - Resilient ad-performance diagnosis pipeline
//!
//! This library turns a campaign performance CSV into validated, schema-
//! governed insights. Every analysis stage runs behind a retrying executor
//! with a safe fallback, thresholds adapt to the noise in the data, and
//! run-over-run drift is tracked against a persisted baseline.

pub mod cli;
pub mod complexity;
pub mod confidence;
pub mod creative;
pub mod drift;
pub mod error;
pub mod evaluator;
pub mod insight;
pub mod outliers;
pub mod pipeline;
pub mod planner;
pub mod report;
pub mod resilience;
pub mod schema;
pub mod stats;
pub mod summary;
pub mod threshold;
