mod api;
mod config;
mod form;
mod logging;
mod server;
mod task;
mod tasks;
mod view_model;
mod views;

use std::fs;

use anyhow::Result;

use crate::api::TaskApi;
use crate::config::AppConfig;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load_with_logging();
    config::init_timezone(&config.timezone);

    fs::create_dir_all(&config.static_dir)?;

    let api = TaskApi::new(&config.api_base_url, config.api_timeout)?;
    tracing::info!(
        environment = config.environment.as_str(),
        api = api.base_url(),
        timezone = %config::get_timezone(),
        "configuration loaded"
    );

    let state = AppState::new(api);
    let shutdown = state.shutdown.clone();
    let app = server::build_router(state, &config.static_dir);

    server::serve(&config, app, shutdown).await
}
