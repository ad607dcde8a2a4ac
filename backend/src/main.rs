//! Main entry point for the Tourline auth backend.
//!
//! Initializes logging, loads configuration, connects the database and
//! serves the Axum application. Missing required configuration aborts
//! startup here; request handlers never read the environment.

use tourline_backend::config::Config;
use tourline_backend::database::Database;
use tourline_backend::{AppState, app};
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().expect("configuration is incomplete");
    let db = Database::new(&config)
        .await
        .expect("database initialization failed");
    let pool = db.pool().clone();

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let state = AppState::new(config, pool);
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!("Starting Tourline auth backend on {}", bind_address);
    axum::serve(listener, router).await.unwrap();
}
