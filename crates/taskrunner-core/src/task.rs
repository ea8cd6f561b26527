use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A named shell command plus the history of its runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub command: String,
    #[serde(default, rename = "taskExecutions")]
    pub executions: Vec<TaskExecution>,
}

impl Task {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            owner: None,
            command: command.into(),
            executions: Vec::new(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Append a finished run. History is append-only.
    pub fn record(&mut self, execution: TaskExecution) {
        self.executions.push(execution);
    }

    pub fn last_execution(&self) -> Option<&TaskExecution> {
        self.executions.last()
    }
}

/// One resolved run attempt. Built only once both timestamps are known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "StoredExecution")]
pub struct TaskExecution {
    #[serde(with = "millis_timestamp")]
    start_time: DateTime<Utc>,
    #[serde(with = "millis_timestamp")]
    end_time: DateTime<Utc>,
    #[serde(default)]
    output: String,
}

/// Wire shape of an execution; loading goes through `TaskExecution::new`
/// so stored records get the same clamp as fresh ones.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredExecution {
    #[serde(deserialize_with = "millis_timestamp::deserialize")]
    start_time: DateTime<Utc>,
    #[serde(deserialize_with = "millis_timestamp::deserialize")]
    end_time: DateTime<Utc>,
    #[serde(default)]
    output: String,
}

impl From<StoredExecution> for TaskExecution {
    fn from(stored: StoredExecution) -> Self {
        Self::new(stored.start_time, stored.end_time, stored.output)
    }
}

impl TaskExecution {
    /// Build a finished execution. An `end` earlier than `start` (clock step)
    /// is clamped to `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, output: impl Into<String>) -> Self {
        Self {
            start_time: start,
            end_time: end.max(start),
            output: output.into(),
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

/// Aggregate counters over a set of tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub with_runs: usize,
    pub unique_owners: usize,
    pub total_runs: usize,
    pub last_run: Option<DateTime<Utc>>,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let owners: HashSet<&str> = tasks
            .iter()
            .filter_map(|t| t.owner.as_deref())
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .collect();

        Self {
            total: tasks.len(),
            with_runs: tasks.iter().filter(|t| !t.executions.is_empty()).count(),
            unique_owners: owners.len(),
            total_runs: tasks.iter().map(|t| t.executions.len()).sum(),
            last_run: tasks
                .iter()
                .flat_map(|t| t.executions.iter())
                .map(|e| e.end_time)
                .max(),
        }
    }
}

mod millis_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
