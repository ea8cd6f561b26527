use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use taskrunner_core::{Config, ExecutorError};

mod commands;
mod dispatch;
mod logging;
mod shutdown;

#[derive(Parser)]
#[command(name = "taskrunner")]
#[command(about = "Register shell commands as tasks and run them on demand", long_about = None)]
struct Cli {
    /// Debug logging (overridden by TASKRUNNER_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or replace a task
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Shell command to run
        #[arg(short, long)]
        command: String,

        /// Owner label
        #[arg(short, long)]
        owner: Option<String>,

        /// Reuse an existing id to replace that task
        #[arg(long)]
        id: Option<String>,
    },

    /// List all tasks
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show one task with its run history
    Show {
        /// Task ID
        task_id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Find tasks whose name contains a string (case-insensitive)
    Search {
        name: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete a task
    Delete {
        /// Task ID
        task_id: String,
    },

    /// Run a task now and record the result
    Run {
        /// Task ID
        task_id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Summary counters over all tasks
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check a command against the validator without storing it
    Check { command: String },

    /// Show or initialise the config file
    Config {
        /// Print the config path only
        #[arg(long)]
        path: bool,

        /// Write a sample config
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    }
}

async fn execute(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Add {
            name,
            command,
            owner,
            id,
        } => {
            let config = Config::load_default()?;
            commands::add(&config, name, command, owner, id).await
        }
        Commands::List { json } => commands::list(&Config::load_default()?, json).await,
        Commands::Show { task_id, json } => {
            commands::show(&Config::load_default()?, &task_id, json).await
        }
        Commands::Search { name, json } => {
            commands::search(&Config::load_default()?, &name, json).await
        }
        Commands::Delete { task_id } => commands::delete(&Config::load_default()?, &task_id).await,
        Commands::Run { task_id, json } => {
            commands::run(&Config::load_default()?, &task_id, json).await
        }
        Commands::Stats { json } => commands::stats(&Config::load_default()?, json).await,
        Commands::Check { command } => commands::check(&command),
        Commands::Config { path, init } => commands::config(path, init).await,
    }
}

/// 2 for rejected requests (bad command, unknown task), 1 for everything
/// else.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ExecutorError>() {
        Some(e) if e.is_client_error() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
