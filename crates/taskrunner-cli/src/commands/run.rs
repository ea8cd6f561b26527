use crate::{dispatch, shutdown};
use taskrunner_core::config::Config;
use taskrunner_core::task::TaskId;

pub async fn run(config: &Config, task_id_str: &str, json: bool) -> anyhow::Result<()> {
    let coordinator = dispatch::create_coordinator(config)?;
    let task_id = TaskId::from_string(task_id_str.to_string());
    let cancel = shutdown::install_interrupt_handler();

    let execution = coordinator.trigger_execution_with(&task_id, &cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&execution)?);
        return Ok(());
    }

    eprintln!(
        "Ran task {} via {} runner in {} ms",
        task_id,
        coordinator.runner_name(),
        execution.duration().num_milliseconds()
    );
    if !execution.output().is_empty() {
        println!("{}", execution.output());
    }

    Ok(())
}
