use crate::error::ExecutorError;
use crate::runner::JobRunner;
use crate::store::TaskStore;
use crate::task::{Task, TaskExecution, TaskId, TaskStats};
use crate::validator::CommandValidator;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Service layer: sequences validation, execution and persistence.
///
/// A trigger walks fetched → validated → dispatched → resolved → persisted.
/// Anything failing before dispatch leaves the store untouched, and a failed
/// dispatch never records an execution.
///
/// Two triggers for the same task are not serialized here. Each one appends
/// to its own copy and the later save wins.
pub struct ExecutionCoordinator {
    store: Arc<dyn TaskStore>,
    runner: Arc<dyn JobRunner>,
    validator: CommandValidator,
}

impl ExecutionCoordinator {
    pub fn new(store: Arc<dyn TaskStore>, runner: Arc<dyn JobRunner>) -> Self {
        Self {
            store,
            runner,
            validator: CommandValidator::new(),
        }
    }

    pub fn runner_name(&self) -> &str {
        self.runner.name()
    }

    pub async fn get_all(&self) -> Result<Vec<Task>, ExecutorError> {
        self.store.find_all().await
    }

    pub async fn get_by_id(&self, id: &TaskId) -> Result<Task, ExecutorError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ExecutorError::TaskNotFound(id.to_string()))
    }

    /// Validate then insert or replace.
    pub async fn upsert(&self, task: Task) -> Result<Task, ExecutorError> {
        self.validator.validate(&task.command)?;
        let saved = self.store.save(task).await?;
        info!(task_id = %saved.id, name = %saved.name, "Task saved");
        Ok(saved)
    }

    pub async fn delete(&self, id: &TaskId) -> Result<(), ExecutorError> {
        self.store.delete_by_id(id).await?;
        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Task>, ExecutorError> {
        self.store.find_by_name_containing_ignore_case(fragment).await
    }

    pub async fn stats(&self) -> Result<TaskStats, ExecutorError> {
        Ok(TaskStats::from_tasks(&self.get_all().await?))
    }

    /// Run a stored task once and append the result to its history.
    pub async fn trigger_execution(&self, id: &TaskId) -> Result<TaskExecution, ExecutorError> {
        self.trigger_execution_with(id, &CancellationToken::new())
            .await
    }

    /// Like [`trigger_execution`](Self::trigger_execution), abandoning the
    /// wait when `cancel` fires.
    pub async fn trigger_execution_with(
        &self,
        id: &TaskId,
        cancel: &CancellationToken,
    ) -> Result<TaskExecution, ExecutorError> {
        let mut task = self.get_by_id(id).await?;

        // The stored command may have been edited behind our back since the
        // last write, so it is checked again here.
        if let Err(e) = self.validator.validate(&task.command) {
            warn!(task_id = %id, reason = %e, "Refusing to run stored command");
            return Err(e.into());
        }

        debug!(task_id = %id, runner = self.runner.name(), "Dispatching");
        let execution = self
            .runner
            .run_and_capture(&task.id, &task.command, cancel)
            .await?;

        task.record(execution.clone());
        self.store.save(task).await?;

        info!(
            task_id = %id,
            runner = self.runner.name(),
            elapsed_ms = execution.duration().num_milliseconds(),
            "Execution recorded"
        );
        Ok(execution)
    }
}
