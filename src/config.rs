use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::error::AppError;
use crate::places::DEFAULT_PLACES_BASE_URL;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Airport map with Google Places details", long_about = None)]
pub struct Cli {
    /// Address the HTTP server listens on.
    #[clap(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Directory holding airports.dat and the page assets.
    #[clap(long, env = "WEB_ROOT", default_value = "wwwroot")]
    pub web_root: PathBuf,

    #[clap(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: String,

    /// Handed to the map page, never used server-side.
    #[clap(long, env = "MAPBOX_ACCESS_TOKEN", hide_env_values = true, default_value = "")]
    pub mapbox_access_token: String,

    #[clap(long, env = "PLACES_BASE_URL", default_value = DEFAULT_PLACES_BASE_URL)]
    pub places_base_url: String,
}

/// What request handlers need from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub web_root: PathBuf,
    pub google_api_key: String,
    pub mapbox_access_token: String,
}

impl Cli {
    pub fn settings(&self) -> Result<Settings, AppError> {
        if !self.web_root.is_dir() {
            return Err(AppError::Config(format!(
                "web root '{}' is not a directory",
                self.web_root.display()
            )));
        }
        if self.google_api_key.trim().is_empty() {
            return Err(AppError::Config("Google API key is empty".to_string()));
        }
        Ok(Settings {
            web_root: self.web_root.clone(),
            google_api_key: self.google_api_key.clone(),
            mapbox_access_token: self.mapbox_access_token.clone(),
        })
    }
}
