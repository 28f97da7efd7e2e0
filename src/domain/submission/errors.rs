use thiserror::Error;

use super::lifecycle::TransitionError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
    #[error("moderation run already in flight for submission {0}")]
    ModerationInProgress(i64),
    #[error("publish failed: {0}")]
    Publish(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}
