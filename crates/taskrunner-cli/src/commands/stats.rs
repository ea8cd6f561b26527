use crate::dispatch;
use taskrunner_core::config::Config;

pub async fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let coordinator = dispatch::create_coordinator(config)?;
    let stats = coordinator.stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Tasks:         {}", stats.total);
    println!("With runs:     {}", stats.with_runs);
    println!("Owners:        {}", stats.unique_owners);
    println!("Total runs:    {}", stats.total_runs);
    println!(
        "Last run:      {}",
        stats
            .last_run
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".into())
    );

    Ok(())
}
