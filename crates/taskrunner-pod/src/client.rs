use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::process::Stdio;
use taskrunner_core::error::ExecutorError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Pod lifecycle phase as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown(String),
}

impl PodPhase {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            p if p.eq_ignore_ascii_case("pending") => PodPhase::Pending,
            p if p.eq_ignore_ascii_case("running") => PodPhase::Running,
            p if p.eq_ignore_ascii_case("succeeded") => PodPhase::Succeeded,
            p if p.eq_ignore_ascii_case("failed") => PodPhase::Failed,
            other => PodPhase::Unknown(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PodPhase::Pending => write!(f, "Pending"),
            PodPhase::Running => write!(f, "Running"),
            PodPhase::Succeeded => write!(f, "Succeeded"),
            PodPhase::Failed => write!(f, "Failed"),
            PodPhase::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// Everything needed to submit one single-container, never-restarting pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSpec {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub container_name: String,
    pub image: String,
    pub command: Vec<String>,
}

impl PodSpec {
    /// Kubernetes `v1/Pod` manifest for this spec in `namespace`.
    pub fn to_manifest(&self, namespace: &str) -> serde_json::Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": self.name,
                "namespace": namespace,
                "labels": self.labels,
            },
            "spec": {
                "restartPolicy": "Never",
                "containers": [{
                    "name": self.container_name,
                    "image": self.image,
                    "command": self.command,
                }],
            },
        })
    }
}

/// The four cluster calls the pod runner needs, all in one namespace.
#[async_trait::async_trait]
pub trait PodClient: Send + Sync {
    async fn create_pod(&self, spec: &PodSpec) -> Result<(), ExecutorError>;

    /// `None` while the pod has no reported phase yet (or is gone).
    async fn pod_phase(&self, name: &str) -> Result<Option<PodPhase>, ExecutorError>;

    async fn pod_logs(&self, name: &str) -> Result<String, ExecutorError>;

    /// Callers treat failures here as best effort: the pod may already be
    /// gone.
    async fn delete_pod(&self, name: &str) -> Result<(), ExecutorError>;
}

/// Drives the cluster through the `kubectl` binary.
pub struct KubectlClient {
    kubectl: String,
    namespace: String,
}

impl KubectlClient {
    pub fn new(kubectl: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kubectl: kubectl.into(),
            namespace: namespace.into(),
        }
    }

    /// Run a kubectl command in our namespace and return stdout.
    async fn run_cmd(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<String, ExecutorError> {
        debug!("Running: {} -n {} {}", self.kubectl, self.namespace, args.join(" "));

        let mut child = Command::new(&self.kubectl)
            .arg("-n")
            .arg(&self.namespace)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutorError::Dispatch(format!("Failed to run {}: {}", self.kubectl, e)))?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input).await?;
            // Closing stdin signals end of manifest.
            drop(pipe);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecutorError::Dispatch(format!(
                "kubectl {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl PodClient for KubectlClient {
    async fn create_pod(&self, spec: &PodSpec) -> Result<(), ExecutorError> {
        let manifest = serde_json::to_vec(&spec.to_manifest(&self.namespace))?;
        self.run_cmd(&["create", "-f", "-"], Some(&manifest)).await?;
        Ok(())
    }

    async fn pod_phase(&self, name: &str) -> Result<Option<PodPhase>, ExecutorError> {
        let raw = self
            .run_cmd(
                &[
                    "get",
                    "pod",
                    name,
                    "--ignore-not-found",
                    "-o",
                    "jsonpath={.status.phase}",
                ],
                None,
            )
            .await?;
        let raw = raw.trim();
        Ok(if raw.is_empty() {
            None
        } else {
            Some(PodPhase::parse(raw))
        })
    }

    async fn pod_logs(&self, name: &str) -> Result<String, ExecutorError> {
        self.run_cmd(&["logs", name], None).await
    }

    async fn delete_pod(&self, name: &str) -> Result<(), ExecutorError> {
        self.run_cmd(
            &["delete", "pod", name, "--ignore-not-found", "--wait=false"],
            None,
        )
        .await?;
        Ok(())
    }
}
