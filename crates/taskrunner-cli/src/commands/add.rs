use crate::dispatch;
use taskrunner_core::config::Config;
use taskrunner_core::error::ExecutorError;
use taskrunner_core::task::{Task, TaskId};
use taskrunner_core::ExecutionCoordinator;

pub async fn run(
    config: &Config,
    name: String,
    command: String,
    owner: Option<String>,
    id: Option<String>,
) -> anyhow::Result<()> {
    let coordinator = dispatch::create_coordinator(config)?;

    let mut task = Task::new(name, command);
    task.owner = owner;
    if let Some(id) = id {
        task.id = TaskId::from_string(id);
        task = keep_history(&coordinator, task).await?;
    }

    let saved = coordinator.upsert(task).await?;

    println!("Task saved:");
    println!("  ID:      {}", saved.id);
    println!("  Name:    {}", saved.name);
    println!("  Command: {}", saved.command);

    Ok(())
}

/// Carry over the run history of the task being replaced. Only a missing
/// task starts from an empty history; a failed read is an error.
async fn keep_history(
    coordinator: &ExecutionCoordinator,
    mut task: Task,
) -> Result<Task, ExecutorError> {
    match coordinator.get_by_id(&task.id).await {
        Ok(existing) => task.executions = existing.executions,
        Err(ExecutorError::TaskNotFound(_)) => {}
        Err(e) => return Err(e),
    }
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;
    use taskrunner_core::{JsonDirTaskStore, TaskExecution, TaskStore};
    use taskrunner_local::LocalProcessRunner;

    fn coordinator(store: Arc<JsonDirTaskStore>) -> ExecutionCoordinator {
        ExecutionCoordinator::new(store, Arc::new(LocalProcessRunner::new(Duration::from_secs(1))))
    }

    #[tokio::test]
    async fn test_replacing_keeps_history() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonDirTaskStore::open(tmp.path()).unwrap());
        let mut original = Task::new("old", "echo old");
        original.id = TaskId::from("t1");
        let now = Utc::now();
        original.record(TaskExecution::new(now, now, "ran"));
        store.save(original.clone()).await.unwrap();

        let mut replacement = Task::new("new", "echo new");
        replacement.id = TaskId::from("t1");
        let merged = keep_history(&coordinator(store), replacement).await.unwrap();

        assert_eq!(merged.name, "new");
        assert_eq!(merged.executions, original.executions);
    }

    #[tokio::test]
    async fn test_new_id_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonDirTaskStore::open(tmp.path()).unwrap());

        let mut task = Task::new("fresh", "echo fresh");
        task.id = TaskId::from("t2");
        let merged = keep_history(&coordinator(store), task).await.unwrap();

        assert!(merged.executions.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_existing_task_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonDirTaskStore::open(tmp.path()).unwrap());
        std::fs::write(tmp.path().join("t3.json"), "{ not json").unwrap();

        let mut task = Task::new("broken", "echo broken");
        task.id = TaskId::from("t3");
        let err = keep_history(&coordinator(store), task).await.unwrap_err();

        assert!(matches!(err, ExecutorError::Store(_)));
    }
}
