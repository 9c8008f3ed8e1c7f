use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod airports;
mod config;
mod detail;
mod error;
mod places;
mod server;

use config::Cli;
use error::AppError;
use places::GooglePlacesClient;
use server::AppState;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine, the environment may already carry everything.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))?)
}

async fn async_main(cli: Cli) -> Result<(), AppError> {
    let settings = cli.settings()?;
    if settings.mapbox_access_token.is_empty() {
        warn!("⚠️ No Mapbox access token configured, the map page will not render tiles");
    }

    let state = AppState {
        settings: Arc::new(settings),
        places: Arc::new(GooglePlacesClient::new(&cli.places_base_url)),
    };
    let app = server::router(state);

    let listener = TcpListener::bind(cli.bind).await?;
    info!("Listening on http://{}", cli.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;

    Ok(())
}
