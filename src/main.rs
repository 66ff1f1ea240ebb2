use coin_dashboard::{
    build_router,
    config::DashboardConfig,
    services::{
        asset_store::AssetStore, coincap::CoinCapService, dashboard::Dashboard,
        state_storage::StateStorage,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coin_dashboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = DashboardConfig::from_env();
    tracing::info!(
        "Using CoinCap at {} (fresh for {}s)",
        config.base_url,
        config.stale_after.as_secs()
    );

    // Rehydrate persisted state
    let store = AssetStore::open(StateStorage::new(&config.state_file));
    let source = Arc::new(CoinCapService::from_config(&config));
    let dashboard = Arc::new(Dashboard::new(
        store,
        source,
        config.icon_url_template.clone(),
    ));

    // Initial fetch; a failure is recorded in the store and the server still starts
    if let Err(e) = dashboard.load().await {
        tracing::warn!("Initial asset fetch failed: {}", e);
    }

    let state = AppState {
        dashboard: dashboard.clone(),
    };
    let app = build_router(state);

    // Start server
    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Server listening on {}", addr);
    }

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    // Final save on the way out
    dashboard.store().persist();
    tracing::info!("Shut down");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
