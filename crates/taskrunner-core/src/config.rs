use crate::error::ExecutorError;
use crate::runner::TimeoutPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
/// Loaded from ~/.config/taskrunner/config.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub mode: RunnerMode,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_kubectl_path")]
    pub kubectl_path: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Overrides each runner's own timeout behaviour when set.
    #[serde(default)]
    pub on_timeout: Option<TimeoutPolicy>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunnerMode {
    Local,
    #[default]
    Pod,
}

impl std::fmt::Display for RunnerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerMode::Local => write!(f, "local"),
            RunnerMode::Pod => write!(f, "pod"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            mode: RunnerMode::default(),
            timeout_seconds: default_timeout_seconds(),
            namespace: default_namespace(),
            image: default_image(),
            kubectl_path: default_kubectl_path(),
            poll_interval_ms: default_poll_interval_ms(),
            on_timeout: None,
        }
    }
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_image() -> String {
    "busybox:latest".to_string()
}

fn default_kubectl_path() -> String {
    "kubectl".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Config {
    /// Load config from the default path, or defaults if there is none.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.check()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("taskrunner")
            .join("config.yaml")
    }

    /// Reject values no runner can work with.
    pub fn check(&self) -> Result<(), ExecutorError> {
        let invalid = |msg: &str| Err(ExecutorError::Config(msg.to_string()));
        if self.runner.timeout_seconds == 0 {
            return invalid("runner.timeout_seconds must be greater than zero");
        }
        if self.runner.poll_interval_ms == 0 {
            return invalid("runner.poll_interval_ms must be greater than zero");
        }
        if self.runner.mode == RunnerMode::Pod {
            if self.runner.namespace.trim().is_empty() {
                return invalid("runner.namespace is required in pod mode");
            }
            if self.runner.image.trim().is_empty() {
                return invalid("runner.image is required in pod mode");
            }
        }
        Ok(())
    }
}

impl StoreConfig {
    /// Directory for the file store, falling back to the data dir.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::store::JsonDirTaskStore::default_dir)
    }
}
