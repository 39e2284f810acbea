pub mod commands;
pub mod error;
pub mod ingest;
pub mod models;
pub mod server;
pub mod store;

use commands::settings::{data_dir_from_env, load_effective_settings};

pub async fn run() -> Result<(), String> {
    let data_dir = data_dir_from_env();
    let settings = load_effective_settings(&data_dir)?;
    log::info!("Using data directory {}", data_dir.display());
    server::serve(settings).await
}
