//! Room Timer - shared, server-authoritative countdowns over WebSockets
//!
//! This is the main entry point for the room-timer server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use room_timer::{
    api::create_router,
    config::Config,
    services::{JsonFileRecordStore, MemoryRecordStore, RecordStore},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over the verbose flag when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("room_timer={},tower_http=info", config.log_level()))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting room-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, data_file={:?}",
          config.host, config.port, config.data_file);

    let store: Arc<dyn RecordStore> = match &config.data_file {
        Some(path) => Arc::new(JsonFileRecordStore::open(path).await?),
        None => Arc::new(MemoryRecordStore::new()),
    };

    let state = Arc::new(AppState::new(config.port, config.host.clone(), store));
    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /createTimer     - Create a timer record");
    info!("  GET  /timer/:id       - Fetch a timer record");
    info!("  GET  /rooms/:room_id  - Live state of a room");
    info!("  GET  /ws              - WebSocket timer sessions");
    info!("  GET  /status          - Server status");
    info!("  GET  /health          - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.registry.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
