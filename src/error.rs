//! Error kinds surfaced by the planner (spec §7).

use thiserror::Error;

/// Stable error kind tag plus a short human-readable message; no stack traces
/// are part of the contract.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlannerError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("rule for agent '{agent}' has no accepted assignment of length {horizon}")]
    UnsatisfiableRule { agent: String, horizon: usize },

    #[error("planner accessed before run() reached a terminal state")]
    NotReady,

    #[error("run cancelled via abort flag")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
