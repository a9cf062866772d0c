use std::sync::Arc;

use trellogram::config::AppConfig;
use trellogram::handlers::{app, AppState};
use trellogram::store::PgBindingStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, tokens, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellogram=info,tower_http=info".into()),
        )
        .init();

    // Missing configuration and an unreachable store are both fatal at
    // startup; there is nothing useful this process can do without them.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let store = match PgBindingStore::connect(&config.database_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Failed to connect to binding store: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;
    let state = Arc::new(AppState::new(config, store));

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Trellogram listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.expect("server");
}
