//! Backup binary for saving every task to a JSON file.
//!
//! Usage: cargo run --bin backup
//!        cargo run --bin backup -- --target my_backup.json
//!        cargo run --bin backup -- --api http://other:4000/api/tasks --target backup.json
//!
//! Writes the task list as returned by the API, pretty-printed.

mod api;
mod config;
mod logging;
mod task;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use std::fs;

use crate::api::TaskApi;
use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "backup")]
#[command(about = "Backup every task to a JSON file")]
struct Args {
    /// Task API URL (overrides TASK_API_URL from .env)
    #[arg(long)]
    api: Option<String>,

    /// Target backup file path (default: backup_{year}_{month}_{day}.json)
    #[arg(long)]
    target: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load_with_logging();
    let api_url = args.api.unwrap_or(config.api_base_url);

    let now = chrono::Utc::now();
    let default_target = format!("backup_{}_{:02}_{:02}.json", now.year(), now.month(), now.day());
    let target_file = args.target.unwrap_or(default_target);

    println!("Source API: {}", api_url);
    println!("Target backup: {}", target_file);

    let api = TaskApi::new(&api_url, config.api_timeout)?;

    println!("Fetching tasks...");
    let tasks = api.list().await?;

    let json = serde_json::to_string_pretty(&tasks)?;
    fs::write(&target_file, json).with_context(|| format!("failed to write {target_file}"))?;
    println!("  Saved {} tasks", tasks.len());

    println!("\nBackup completed successfully!");
    println!("Backup saved to: {}", target_file);

    Ok(())
}
