//! Model error types.

use thiserror::Error;

use crate::job::JobState;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobState, to: JobState },

    #[error("Job is already terminal ({0})")]
    AlreadyTerminal(JobState),

    #[error("Invalid remote key: {0}")]
    InvalidRemoteKey(String),
}

impl ModelError {
    /// True when the job had already finished (usually cancelled) before the
    /// transition was attempted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModelError::AlreadyTerminal(_))
    }
}
