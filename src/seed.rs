//! Seed binary for populating the task API with example tasks.
//!
//! Usage: cargo run --bin seed
//!        cargo run --bin seed -- --file other.toml --api http://localhost:4000/api/tasks
//!
//! Reads from seed.toml in the project root and creates each task through the API.

mod api;
mod config;
mod logging;
mod task;

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use clap::Parser;
use serde::Deserialize;
use std::fs;

use crate::api::TaskApi;
use crate::config::AppConfig;
use crate::task::TaskPayload;

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Create the tasks listed in a seed file")]
struct Args {
    /// Seed file to read
    #[arg(long, default_value = "seed.toml")]
    file: String,

    /// Task API URL (overrides TASK_API_URL from .env)
    #[arg(long)]
    api: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedData {
    tasks: Vec<SeedTask>,
}

#[derive(Debug, Deserialize)]
struct SeedTask {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_status")]
    status: String,
    /// Calendar day as YYYY-MM-DD
    due: String,
}

fn default_status() -> String {
    "Not Started".to_string()
}

impl SeedTask {
    /// Due date is local midnight, the same as a date entered in the form.
    fn to_payload(&self, tz: Tz) -> Result<TaskPayload> {
        let day = NaiveDate::parse_from_str(&self.due, "%Y-%m-%d")
            .with_context(|| format!("invalid due date {:?} for {:?}", self.due, self.title))?;
        let midnight = day.and_time(chrono::NaiveTime::MIN);
        let due = tz
            .from_local_datetime(&midnight)
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight));

        Ok(TaskPayload {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            status: self.status.clone(),
            due_date: due.with_timezone(&Utc),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load_with_logging();
    let tz = config::parse_timezone(&config.timezone);
    let api_url = args.api.unwrap_or(config.api_base_url);

    println!("🌱 Seeding tasks...");
    let api = TaskApi::new(&api_url, config.api_timeout)?;
    println!("📦 Task API: {}", api.base_url());

    let seed_content = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file))?;
    let seed_data: SeedData = toml::from_str(&seed_content)?;

    println!("📋 Found {} tasks to seed", seed_data.tasks.len());

    for seed_task in seed_data.tasks {
        let payload = match seed_task.to_payload(tz) {
            Ok(payload) => payload,
            Err(e) => {
                println!("  ✗ Skipped task {}: {}", seed_task.title, e);
                continue;
            }
        };
        match api.create(&payload).await {
            Ok(task) => println!("  ✓ Created task: {} (id: {})", task.title, task.id),
            Err(e) => println!("  ✗ Failed to create task {}: {}", payload.title, e),
        }
    }

    println!("✅ Seeding complete!");

    Ok(())
}
