mod local_runner;
pub mod spawner;

pub use local_runner::{normalize_output, LocalProcessRunner};
pub use spawner::{ProcessSpawner, RunningProcess, TokioSpawner};
