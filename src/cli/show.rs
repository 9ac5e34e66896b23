use clap::Subcommand;
use google_objects::{Config, Result};
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show the config file and service account key paths
    Paths,
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;
    info!(path = ?config_path, "Config path");

    let config = Config::load()?;
    match config.google.service_account_path() {
        Some(path) => info!(path = ?path, exists = path.exists(), "Service account key"),
        None => info!("No service account key configured"),
    }

    Ok(())
}
