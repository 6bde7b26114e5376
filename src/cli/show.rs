use clap::Subcommand;
use trix::auth::TokenCache;
use trix::{Result, Settings};
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show settings, secret and credential cache paths
    Paths,
    /// Show the effective settings
    Settings,
}

impl ShowResource {
    pub fn execute(&self, settings: &Settings) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(settings),
            ShowResource::Settings => show_settings(settings),
        }
    }
}

fn show_paths(settings: &Settings) -> Result<()> {
    let config_path = Settings::config_file()?;
    let cache = TokenCache::new(&settings.cache_dir);

    info!(path = ?config_path, "Settings path");
    info!(path = ?settings.secret_file, "Client secret path");
    info!(path = ?cache.path(), "Credential cache path");

    Ok(())
}

fn show_settings(settings: &Settings) -> Result<()> {
    let rendered = toml::to_string_pretty(settings)
        .map_err(|e| trix::AppError::Config(format!("Failed to render settings: {}", e)))?;
    println!("{}", rendered);

    Ok(())
}
