//! Error types for `nutriplan-core`.
//!
//! Most core operations are infallible by construction (parsing falls back,
//! history boundaries are no-ops, partition mismatches are logged). Errors
//! only arise at the gates the surrounding workflow enforces.

use thiserror::Error;

use crate::wizard::Step;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{remaining} product(s) still uncategorized")]
  Incomplete { remaining: usize },

  #[error("cannot leave step {step}: {reason}")]
  StepBlocked { step: Step, reason: String },

  #[error("the plan is locked on step {step}; go back to meals to change it")]
  PlanLocked { step: Step },

  #[error("persistence error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
