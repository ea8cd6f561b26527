use crate::validator::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Command timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Command execution interrupted")]
    Interrupted,

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Task store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExecutorError {
    /// True for rejections caused by the request itself (bad command, unknown
    /// id) as opposed to failures while running it.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExecutorError::Validation(_) | ExecutorError::TaskNotFound(_)
        )
    }
}
