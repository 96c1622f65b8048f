use std::sync::Arc;
use tracing::{error, info, warn};
use tunetransfer::config::Config;
use tunetransfer::migrate::Migrator;
use tunetransfer::server::{build_router, AppState};
use tunetransfer::spotify::SpotifyClient;
use tunetransfer::ytmusic::YtMusicConnector;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunetransfer=info,tower_http=info".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let spotify = SpotifyClient::new(config.spotify.clone());
    if !spotify.has_credentials() {
        warn!("Spotify credentials not set - every migration will fail until SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET (or SPOTIFY_BEARER_TOKEN) are configured");
    }

    let migrator = Migrator::new(
        Arc::new(spotify),
        Arc::new(YtMusicConnector::new(config.ytmusic_api_base.clone())),
        config.market.clone(),
    );

    let state = AppState {
        migrator: Arc::new(migrator),
    };

    let app = match build_router(state, &config.frontend_url) {
        Ok(app) => app,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting server on {}", addr);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
