use crate::dispatch;
use taskrunner_core::config::Config;
use taskrunner_core::task::TaskId;

pub async fn run(config: &Config, task_id_str: &str) -> anyhow::Result<()> {
    let coordinator = dispatch::create_coordinator(config)?;
    let task_id = TaskId::from_string(task_id_str.to_string());

    coordinator.delete(&task_id).await?;
    println!("Task {} deleted.", task_id);

    Ok(())
}
