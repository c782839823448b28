use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use impostor::{
    adapter::TracingAdapter, config::Config, sequencer::GameController, status,
    store::MemoryStore,
};

/// Curated secret-word pool, shipped with the binary.
static FOOTBALLERS_JSON: &str = include_str!("../data/footballers.json");

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "impostor=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(room = %config.room_name, "Starting impostor room...");

    let footballers: Vec<String> =
        serde_json::from_str(FOOTBALLERS_JSON).expect("bundled footballers.json is valid");
    tracing::info!(count = footballers.len(), "Secret-word pool loaded");

    let adapter = Arc::new(TracingAdapter);
    let store = Arc::new(MemoryStore::new());
    let controller = GameController::new(
        adapter,
        store,
        footballers,
        config.settings(),
        config.admin_key.clone(),
        config.room_name.clone(),
    );

    // A real room adapter drives the game through this handle; it stays
    // alive here so the event loop keeps running for local inspection.
    let _handle = controller.handle();

    let app = status::router(controller.status());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Status endpoint on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("status port is free");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "status server stopped");
        }
    });

    tokio::select! {
        _ = controller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down...");
        }
    }
}
