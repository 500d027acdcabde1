//! Faculty records core: document approval state machine and tenure rank evaluation.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
