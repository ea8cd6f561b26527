pub mod config;
pub mod coordinator;
pub mod error;
pub mod runner;
pub mod store;
pub mod task;
pub mod validator;

pub use config::Config;
pub use coordinator::ExecutionCoordinator;
pub use error::ExecutorError;
pub use runner::{JobRunner, TimeoutPolicy};
pub use store::{JsonDirTaskStore, MemoryTaskStore, TaskStore};
pub use task::{Task, TaskExecution, TaskId, TaskStats};
pub use validator::{CommandValidator, ValidationError};
