use crate::spawner::{ProcessSpawner, RunningProcess, TokioSpawner};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use taskrunner_core::error::ExecutorError;
use taskrunner_core::runner::{JobRunner, TimeoutPolicy};
use taskrunner_core::task::{TaskExecution, TaskId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Local runner: runs the command as a child process of this one.
pub struct LocalProcessRunner {
    spawner: Arc<dyn ProcessSpawner>,
    timeout: Duration,
    on_timeout: TimeoutPolicy,
    windows: bool,
}

enum Outcome {
    Finished { exit_code: i32, raw: String },
    TimedOut,
    Interrupted,
}

impl LocalProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self::with_spawner(Arc::new(TokioSpawner), timeout)
    }

    pub fn with_spawner(spawner: Arc<dyn ProcessSpawner>, timeout: Duration) -> Self {
        Self {
            spawner,
            timeout,
            on_timeout: TimeoutPolicy::Fail,
            windows: cfg!(windows),
        }
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.on_timeout = policy;
        self
    }

    /// Build argv for the host shell instead of the current platform.
    pub fn for_windows(mut self, windows: bool) -> Self {
        self.windows = windows;
        self
    }

    pub fn shell_argv(&self, command: &str) -> Vec<String> {
        if self.windows {
            vec!["cmd.exe".into(), "/c".into(), command.into()]
        } else {
            vec!["sh".into(), "-c".into(), command.into()]
        }
    }

    /// Wait for exit and then for the output pipes to close, both bounded by
    /// the same deadline and cancel token. A grandchild that keeps the pipes
    /// open after the shell exits counts against the deadline too.
    async fn supervise(
        process: &mut Box<dyn RunningProcess>,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ExecutorError> {
        let exit_code = tokio::select! {
            status = process.wait() => status.map_err(|e| {
                ExecutorError::Dispatch(format!("Failed waiting for process: {}", e))
            })?,
            _ = tokio::time::sleep_until(deadline) => return Ok(Outcome::TimedOut),
            _ = cancel.cancelled() => return Ok(Outcome::Interrupted),
        };

        let raw = tokio::select! {
            raw = process.read_all_output() => raw.map_err(|e| {
                ExecutorError::Dispatch(format!("Failed to read output: {}", e))
            })?,
            _ = tokio::time::sleep_until(deadline) => return Ok(Outcome::TimedOut),
            _ = cancel.cancelled() => return Ok(Outcome::Interrupted),
        };

        Ok(Outcome::Finished { exit_code, raw })
    }

    async fn kill(process: &mut Box<dyn RunningProcess>, task_id: &TaskId) {
        if let Err(e) = process.force_kill().await {
            warn!(task_id = %task_id, error = %e, "Failed to kill process");
        }
    }
}

/// Trim output and append the exit-code trailer for failed runs.
pub fn normalize_output(raw: &str, exit_code: i32) -> String {
    let trimmed = raw.trim();
    if exit_code == 0 {
        return trimmed.to_string();
    }
    append_trailer(trimmed, &format!("Process exited with code {}", exit_code))
}

fn append_trailer(body: &str, trailer: &str) -> String {
    if body.is_empty() {
        trailer.to_string()
    } else {
        format!("{}{}{}", body, LINE_ENDING, trailer)
    }
}

#[async_trait::async_trait]
impl JobRunner for LocalProcessRunner {
    fn name(&self) -> &str {
        "local"
    }

    async fn run_and_capture(
        &self,
        task_id: &TaskId,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<TaskExecution, ExecutorError> {
        let start = Utc::now();
        let deadline = Instant::now() + self.timeout;
        let argv = self.shell_argv(command);
        debug!(task_id = %task_id, ?argv, "Local exec");

        let mut process = self
            .spawner
            .spawn(&argv)
            .await
            .map_err(|e| ExecutorError::Dispatch(format!("Failed to spawn: {}", e)))?;

        let seconds = self.timeout.as_secs();
        match Self::supervise(&mut process, deadline, cancel).await? {
            Outcome::Finished { exit_code, raw } => {
                let end = Utc::now();
                info!(task_id = %task_id, exit_code, "Local process exited");
                Ok(TaskExecution::new(start, end, normalize_output(&raw, exit_code)))
            }
            Outcome::TimedOut => {
                warn!(task_id = %task_id, seconds, policy = %self.on_timeout, "Local process timed out, killing");
                Self::kill(&mut process, task_id).await;

                match self.on_timeout {
                    TimeoutPolicy::Fail => Err(ExecutorError::Timeout { seconds }),
                    TimeoutPolicy::Partial => {
                        let raw = process.read_all_output().await.unwrap_or_default();
                        let output = append_trailer(
                            raw.trim(),
                            &format!("Process timed out after {} seconds", seconds),
                        );
                        Ok(TaskExecution::new(start, Utc::now(), output))
                    }
                }
            }
            Outcome::Interrupted => {
                warn!(task_id = %task_id, "Local execution interrupted, killing");
                Self::kill(&mut process, task_id).await;
                Err(ExecutorError::Interrupted)
            }
        }
    }
}
