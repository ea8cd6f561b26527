pub mod client;
pub mod naming;
mod pod_runner;

pub use client::{KubectlClient, PodClient, PodPhase, PodSpec};
pub use pod_runner::{OrchestratedPodRunner, APP_LABEL, CONTAINER_NAME};
