//! Typed errors for caller-misuse conditions
//!
//! Runtime load behavior (actor failures, scenario failures) is recorded in
//! result artifacts and never surfaces as an error. The variants here are the
//! only conditions that propagate to the caller, since they indicate misuse
//! rather than load behavior.

use thiserror::Error;

/// Errors surfaced to the calling harness.
#[derive(Debug, Error)]
pub enum LabError {
    /// No baseline was captured for the requested version/environment pair.
    #[error("baseline not found for version '{version}' in environment '{environment}'")]
    BaselineNotFound {
        version: String,
        environment: String,
    },

    /// A comprehensive run was started while another is still in progress.
    #[error("a comprehensive test run is already in progress")]
    AlreadyRunning,

    /// A configuration value failed validation before the run started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
