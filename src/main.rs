//! HTTP server: accepts uploads on `/process-video` and serves the HLS output under `/streams`.

use hls_ladder::adapters::local::{events, http, EventHub};
use hls_ladder::AppConfig;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    hls_ladder::init_tracing();
    config.log_fallbacks();

    for dir in [&config.public_dir, &config.streams_dir, &config.upload_dir] {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            error!("Failed to create {:?}: {}", dir, e);
            std::process::exit(1);
        }
    }

    let event_hub = Arc::new(EventHub::new());
    events::listener::start(event_hub.clone());

    let app = http::router(hls_ladder::app_state(&config, event_hub));

    let listener = match tokio::net::TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_address(), e);
            std::process::exit(1);
        }
    };
    info!("App running at http://{}", config.bind_address());

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
