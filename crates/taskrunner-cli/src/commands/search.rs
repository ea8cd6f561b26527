use crate::commands::list::print_tasks;
use crate::dispatch;
use taskrunner_core::config::Config;

pub async fn run(config: &Config, name: &str, json: bool) -> anyhow::Result<()> {
    let coordinator = dispatch::create_coordinator(config)?;
    let found = coordinator.search_by_name(name).await?;
    print_tasks(&found, json)
}
