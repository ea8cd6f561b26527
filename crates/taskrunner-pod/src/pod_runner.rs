use crate::client::{PodClient, PodPhase, PodSpec};
use crate::naming;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use taskrunner_core::error::ExecutorError;
use taskrunner_core::runner::{JobRunner, TimeoutPolicy};
use taskrunner_core::task::{TaskExecution, TaskId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const APP_LABEL: &str = "task-runner";
pub const CONTAINER_NAME: &str = "runner";

/// Pod runner: each run is a fresh single-container pod that is deleted
/// once its logs have been read.
pub struct OrchestratedPodRunner {
    client: Arc<dyn PodClient>,
    image: String,
    timeout: Duration,
    poll_interval: Duration,
    on_timeout: TimeoutPolicy,
}

/// How the polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Watch {
    Terminal,
    DeadlinePassed,
    Interrupted,
}

impl OrchestratedPodRunner {
    pub fn new(client: Arc<dyn PodClient>, image: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            image: image.into(),
            timeout,
            poll_interval: Duration::from_secs(1),
            on_timeout: TimeoutPolicy::Partial,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.on_timeout = policy;
        self
    }

    pub fn pod_spec(&self, task_id: &TaskId, name: String, command: &str) -> PodSpec {
        let labels = BTreeMap::from([
            ("app".to_string(), APP_LABEL.to_string()),
            ("taskId".to_string(), naming::task_label(task_id.as_str())),
        ]);
        PodSpec {
            name,
            labels,
            container_name: CONTAINER_NAME.to_string(),
            image: self.image.clone(),
            command: vec!["sh".into(), "-c".into(), command.into()],
        }
    }

    /// Poll until the pod is terminal, the deadline passes, or `cancel`
    /// fires. Returns the last phase seen, which may be non-terminal.
    async fn watch(
        &self,
        pod: &str,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> (Watch, Option<PodPhase>) {
        let mut last = None;
        loop {
            match self.client.pod_phase(pod).await {
                Ok(Some(phase)) => {
                    debug!(pod, %phase, "Pod phase");
                    let terminal = phase.is_terminal();
                    last = Some(phase);
                    if terminal {
                        return (Watch::Terminal, last);
                    }
                }
                Ok(None) => debug!(pod, "Pod has no phase yet"),
                Err(e) => warn!(pod, error = %e, "Failed to read pod phase"),
            }

            if Instant::now() >= deadline {
                return (Watch::DeadlinePassed, last);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => return (Watch::Interrupted, last),
            }
        }
    }

    async fn collect_logs(&self, pod: &str) -> String {
        match self.client.pod_logs(pod).await {
            Ok(logs) => logs.trim().to_string(),
            Err(e) => {
                warn!(pod, error = %e, "Failed to fetch pod logs");
                String::new()
            }
        }
    }

    /// Best-effort delete: the result is logged and dropped here on purpose.
    async fn discard_pod(&self, pod: &str) {
        if let Err(e) = self.client.delete_pod(pod).await {
            warn!(pod, error = %e, "Pod cleanup failed");
        }
    }
}

#[async_trait::async_trait]
impl JobRunner for OrchestratedPodRunner {
    fn name(&self) -> &str {
        "pod"
    }

    async fn run_and_capture(
        &self,
        task_id: &TaskId,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<TaskExecution, ExecutorError> {
        let start = Utc::now();
        let deadline = Instant::now() + self.timeout;
        let pod = naming::pod_name(task_id.as_str(), start.timestamp_millis());
        let spec = self.pod_spec(task_id, pod.clone(), command);

        self.client.create_pod(&spec).await.map_err(|e| match e {
            ExecutorError::Dispatch(_) => e,
            other => ExecutorError::Dispatch(format!("Failed to create pod {}: {}", pod, other)),
        })?;
        info!(task_id = %task_id, pod = %pod, image = %self.image, "Pod created");

        let (watch, phase) = self.watch(&pod, deadline, cancel).await;

        let output = self.collect_logs(&pod).await;
        self.discard_pod(&pod).await;
        let end = Utc::now();

        let phase = phase.map(|p| p.to_string()).unwrap_or_else(|| "none".into());
        match watch {
            Watch::Terminal => {
                info!(task_id = %task_id, pod = %pod, phase = %phase, "Pod finished")
            }
            Watch::DeadlinePassed => {
                warn!(task_id = %task_id, pod = %pod, phase = %phase, "Pod did not finish before deadline");
                if self.on_timeout == TimeoutPolicy::Fail {
                    return Err(ExecutorError::Timeout {
                        seconds: self.timeout.as_secs(),
                    });
                }
            }
            Watch::Interrupted => {
                warn!(task_id = %task_id, pod = %pod, phase = %phase, "Pod watch interrupted")
            }
        }

        Ok(TaskExecution::new(start, end, output))
    }
}
