use crate::dispatch;
use taskrunner_core::config::Config;
use taskrunner_core::task::{Task, TaskId};

pub async fn run(config: &Config, task_id_str: &str, json: bool) -> anyhow::Result<()> {
    let coordinator = dispatch::create_coordinator(config)?;
    let task = coordinator
        .get_by_id(&TaskId::from_string(task_id_str.to_string()))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        print_task(&task);
    }

    Ok(())
}

fn print_task(task: &Task) {
    println!("Task:     {}", task.id);
    println!("Name:     {}", task.name);
    println!("Owner:    {}", task.owner.as_deref().unwrap_or("-"));
    println!("Command:  {}", task.command);
    println!("Runs:     {}", task.executions.len());

    for (i, run) in task.executions.iter().enumerate() {
        println!();
        println!(
            "#{} {} ({} ms)",
            i + 1,
            run.start_time().to_rfc3339(),
            run.duration().num_milliseconds()
        );
        for line in run.output().lines() {
            println!("   {}", line);
        }
    }
}
