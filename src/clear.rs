//! Clear binary for deleting every task behind the task API.
//!
//! Usage: cargo run --bin clear -- --yes
//!
//! Lists all tasks and deletes them one by one.

mod api;
mod config;
mod logging;
mod task;

use anyhow::{bail, Result};
use clap::Parser;

use crate::api::TaskApi;
use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "clear")]
#[command(about = "Delete every task")]
struct Args {
    /// Confirm that every task should be deleted
    #[arg(long)]
    yes: bool,

    /// Task API URL (overrides TASK_API_URL from .env)
    #[arg(long)]
    api: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load_with_logging();
    let api_url = args.api.unwrap_or(config.api_base_url);

    if !args.yes {
        bail!("refusing to delete every task at {api_url} without --yes");
    }

    println!("Connecting to task API: {}", api_url);
    let api = TaskApi::new(&api_url, config.api_timeout)?;

    let tasks = api.list().await?;
    println!("Deleting {} tasks...", tasks.len());

    let mut failed = 0;
    for task in &tasks {
        match api.delete(task.id).await {
            Ok(()) => println!("  Deleted {} ({})", task.id, task.title),
            Err(e) => {
                failed += 1;
                println!("  Failed to delete {}: {}", task.id, e);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} tasks could not be deleted");
    }

    println!("All tasks cleared successfully!");

    Ok(())
}
