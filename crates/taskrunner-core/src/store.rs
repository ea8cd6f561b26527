use crate::error::ExecutorError;
use crate::task::{Task, TaskId};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Durable home of tasks and their histories.
///
/// Each call is atomic on its own; nothing spans two calls.
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert or replace by id.
    async fn save(&self, task: Task) -> Result<Task, ExecutorError>;

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, ExecutorError>;

    async fn find_all(&self) -> Result<Vec<Task>, ExecutorError>;

    /// Deleting an unknown id is not an error.
    async fn delete_by_id(&self, id: &TaskId) -> Result<(), ExecutorError>;

    async fn find_by_name_containing_ignore_case(
        &self,
        fragment: &str,
    ) -> Result<Vec<Task>, ExecutorError>;
}

fn name_matches(task: &Task, fragment_lower: &str) -> bool {
    task.name.to_lowercase().contains(fragment_lower)
}

/// In-process store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl TaskStore for MemoryTaskStore {
    async fn save(&self, task: Task) -> Result<Task, ExecutorError> {
        self.tasks.write().await.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, ExecutorError> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Task>, ExecutorError> {
        let mut all: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn delete_by_id(&self, id: &TaskId) -> Result<(), ExecutorError> {
        self.tasks.write().await.remove(id);
        Ok(())
    }

    async fn find_by_name_containing_ignore_case(
        &self,
        fragment: &str,
    ) -> Result<Vec<Task>, ExecutorError> {
        let needle = fragment.to_lowercase();
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|t| name_matches(t, &needle))
            .collect())
    }
}

/// Stores each task as `<id>.json` in one directory.
///
/// Writes go to a per-save temp file that is then renamed over the target,
/// so a reader never sees a half-written task.
#[derive(Debug, Clone)]
pub struct JsonDirTaskStore {
    dir: PathBuf,
}

impl JsonDirTaskStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ExecutorError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            ExecutorError::Store(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    /// Default data directory: <data_local_dir>/taskrunner/tasks
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("taskrunner")
            .join("tasks")
    }

    fn task_path(&self, id: &TaskId) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(id)))
    }

    async fn read_task(path: &Path) -> Result<Task, ExecutorError> {
        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExecutorError::Store(format!("read {}: {}", path.display(), e)))?;
        serde_json::from_str(&data)
            .map_err(|e| ExecutorError::Store(format!("decode {}: {}", path.display(), e)))
    }
}

/// Write into a fresh temp file in `dir`, then rename it over `target`.
/// Every writer gets its own temp file, so concurrent saves of one task
/// cannot clobber each other; the last rename wins.
fn write_atomically(dir: &Path, target: &Path, contents: &[u8]) -> Result<(), ExecutorError> {
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| ExecutorError::Store(format!("temp file in {}: {}", dir.display(), e)))?;
    tmp.write_all(contents)
        .map_err(|e| ExecutorError::Store(format!("write {}: {}", tmp.path().display(), e)))?;
    tmp.persist(target)
        .map_err(|e| ExecutorError::Store(format!("rename {}: {}", target.display(), e.error)))?;
    Ok(())
}

/// Ids are opaque, so anything outside a conservative filename alphabet is
/// percent-encoded.
fn file_stem(id: &TaskId) -> String {
    let mut out = String::with_capacity(id.0.len());
    for b in id.0.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[async_trait::async_trait]
impl TaskStore for JsonDirTaskStore {
    async fn save(&self, task: Task) -> Result<Task, ExecutorError> {
        let path = self.task_path(&task.id);
        let json = serde_json::to_string_pretty(&task)?;

        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, json.as_bytes()))
            .await
            .map_err(|e| ExecutorError::Store(format!("save {}: {}", path.display(), e)))??;

        debug!(task_id = %task.id, path = %path.display(), "Saved task");
        Ok(task)
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, ExecutorError> {
        let path = self.task_path(id);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read_task(&path).await.map(Some)
    }

    async fn find_all(&self) -> Result<Vec<Task>, ExecutorError> {
        let mut results = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| ExecutorError::Store(format!("list {}: {}", self.dir.display(), e)))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match Self::read_task(&path).await {
                Ok(task) => results.push(task),
                Err(e) => warn!("Skipping unreadable task file: {}", e),
            }
        }

        results.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(results)
    }

    async fn delete_by_id(&self, id: &TaskId) -> Result<(), ExecutorError> {
        let path = self.task_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExecutorError::Store(format!(
                "delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn find_by_name_containing_ignore_case(
        &self,
        fragment: &str,
    ) -> Result<Vec<Task>, ExecutorError> {
        let needle = fragment.to_lowercase();
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|t| name_matches(t, &needle))
            .collect())
    }
}
