pub mod domain;
pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;

use std::sync::Arc;

use crate::domain::a001_pass::service::PassService;
use crate::shared::state::{AppState, AuthSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::middleware;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    // `backend hash-password <password>` печатает PHC-строку для config.toml
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let password = args
            .get(2)
            .ok_or_else(|| anyhow::anyhow!("usage: backend hash-password <password>"))?;
        println!("{}", system::auth::password::hash_password(password)?);
        return Ok(());
    }

    let config = shared::config::load_config()?;
    system::tracing::initialize(&config.logging)?;

    let db_path = shared::config::get_database_path(&config)?;
    let conn = shared::data::db::initialize_database(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    tracing::info!(
        "Catalog: {} events, {} tiers",
        config.catalog.events.len(),
        config.catalog.tiers.len()
    );
    let passes = PassService::new(conn, Arc::new(config.catalog.clone()), config.barcodes.clone());
    let state = AppState::new(passes, AuthSettings::from_config(&config.auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = routes::configure_routes(state)
        .layer(middleware::from_fn(system::middleware::request_logger::request_logger))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {e}"))?;

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    addr.port()
                );
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
