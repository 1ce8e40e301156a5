//! Load simulation and capacity planning library
//!
//! This crate provides the core functionality for:
//! - Simulated actors driving a task-processing backend
//! - Load test execution (ramp-up, sustain, ramp-down)
//! - Stress suite orchestration and analysis
//! - Benchmark scoring with trends and baselines
//! - Capacity planning from calibratable resource and cost models

pub mod backend;
pub mod benchmark;
pub mod capacity;
pub mod error;
pub mod loadtest;
pub mod observability;
pub mod report;
pub mod runner;
pub mod sim;
pub mod stress;

pub use error::LabError;
pub use observability::LabMetrics;
pub use runner::{ComprehensivePlan, ComprehensiveTestReport, ComprehensiveTestRunner};
