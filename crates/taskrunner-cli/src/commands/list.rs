use crate::dispatch;
use taskrunner_core::config::Config;
use taskrunner_core::task::Task;

pub async fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let coordinator = dispatch::create_coordinator(config)?;
    let tasks = coordinator.get_all().await?;
    print_tasks(&tasks, json)
}

/// Table or JSON array of tasks, shared with `search`.
pub fn print_tasks(tasks: &[Task], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    println!(
        "{:<38} {:<20} {:<10} {:<5} {:<20} {}",
        "TASK ID", "NAME", "OWNER", "RUNS", "LAST RUN", "COMMAND"
    );
    println!("{}", "-".repeat(110));
    for task in tasks {
        let last_run = task
            .last_execution()
            .map(|run| run.end_time().format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<20} {:<10} {:<5} {:<20} {}",
            task.id,
            task.name,
            task.owner.as_deref().unwrap_or("-"),
            task.executions.len(),
            last_run,
            task.command,
        );
    }

    Ok(())
}
