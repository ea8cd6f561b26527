use std::sync::Arc;
use std::time::Duration;
use taskrunner_core::config::{Config, RunnerConfig, RunnerMode, StoreConfig, StoreKind};
use taskrunner_core::error::ExecutorError;
use taskrunner_core::{ExecutionCoordinator, JobRunner, JsonDirTaskStore, MemoryTaskStore, TaskStore};
use taskrunner_local::LocalProcessRunner;
use taskrunner_pod::{KubectlClient, OrchestratedPodRunner};

/// Build the one runner this process will use.
pub fn create_runner(config: &RunnerConfig) -> Arc<dyn JobRunner> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    match config.mode {
        RunnerMode::Local => {
            let mut runner = LocalProcessRunner::new(timeout);
            if let Some(policy) = config.on_timeout {
                runner = runner.with_timeout_policy(policy);
            }
            Arc::new(runner)
        }
        RunnerMode::Pod => {
            let client = KubectlClient::new(config.kubectl_path.clone(), config.namespace.clone());
            let mut runner = OrchestratedPodRunner::new(Arc::new(client), config.image.clone(), timeout)
                .with_poll_interval(Duration::from_millis(config.poll_interval_ms));
            if let Some(policy) = config.on_timeout {
                runner = runner.with_timeout_policy(policy);
            }
            Arc::new(runner)
        }
    }
}

pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn TaskStore>, ExecutorError> {
    match config.kind {
        StoreKind::File => Ok(Arc::new(JsonDirTaskStore::open(config.resolved_path())?)),
        StoreKind::Memory => Ok(Arc::new(MemoryTaskStore::new())),
    }
}

pub fn create_coordinator(config: &Config) -> Result<ExecutionCoordinator, ExecutorError> {
    let store = create_store(&config.store)?;
    let runner = create_runner(&config.runner);
    Ok(ExecutionCoordinator::new(store, runner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_follows_mode() {
        let mut config = RunnerConfig::default();
        assert_eq!(create_runner(&config).name(), "pod");

        config.mode = RunnerMode::Local;
        assert_eq!(create_runner(&config).name(), "local");
    }

    #[tokio::test]
    async fn test_file_store_lands_in_configured_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            kind: StoreKind::File,
            path: Some(tmp.path().join("tasks")),
        };
        let store = create_store(&config).unwrap();
        store
            .save(taskrunner_core::Task::new("a", "echo a"))
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(tmp.path().join("tasks")).unwrap().count(), 1);
    }
}
