use crate::error::ExecutorError;
use crate::task::{TaskExecution, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Core runner trait. Each execution strategy (local process, cluster pod)
/// implements this; exactly one is active per process.
#[async_trait::async_trait]
pub trait JobRunner: Send + Sync {
    /// Runner kind ("local", "pod").
    fn name(&self) -> &str;

    /// Run `command` on behalf of `task_id` and return the resolved attempt.
    ///
    /// The start timestamp is taken before dispatch and the end timestamp
    /// after the attempt resolves. Cancelling `cancel` abandons the wait and
    /// moves straight to cleanup.
    async fn run_and_capture(
        &self,
        task_id: &TaskId,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<TaskExecution, ExecutorError>;
}

/// What a runner does when the deadline passes before the command finishes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Clean up and return `ExecutorError::Timeout`.
    Fail,
    /// Clean up and return whatever output was observed.
    Partial,
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPolicy::Fail => write!(f, "fail"),
            TimeoutPolicy::Partial => write!(f, "partial"),
        }
    }
}
