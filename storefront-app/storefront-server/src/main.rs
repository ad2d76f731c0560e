use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use storefront_api::{build_router, AppState};
use storefront_core::repositories::MenuRepository;
use storefront_infrastructure::{create_pool, run_migrations, InMemoryMenuRepository, PgMenuRepository};
use storefront_shared::config::{AppConfig, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize telemetry; the guard flushes the file writer on exit
    let _log_guard = storefront_shared::telemetry::init_telemetry(&config.logging)?;

    info!("{} starting ({})...", config.app.name, config.app.env);

    // Storage backend
    let menu_repo: Arc<dyn MenuRepository> = match config.storage.backend {
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let pool = create_pool(&config.database).await?;
            if config.database.run_migrations {
                run_migrations(&pool).await?;
                info!("Database migrations applied.");
            }
            info!("Database connection established.");
            Arc::new(PgMenuRepository::new(pool))
        }
        StorageBackend::Memory => {
            info!("Using in-memory menu storage; menus are lost on restart.");
            Arc::new(InMemoryMenuRepository::new())
        }
    };

    match config.navigation.depth_limit() {
        Some(max_depth) => info!("Menu depth limited to {} levels", max_depth),
        None => info!("Menu depth is unlimited"),
    }

    // Build router
    let state = AppState::new(menu_repo, config.clone());
    let app = build_router(state);

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}
