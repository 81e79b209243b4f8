use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use api::config::ServerConfig;
use api::routes;
use api::state::AppState;
use api::storage::{MemStorage, PgStorage, Storage, postgres};
use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("starting personnel bookkeeping service");

    let server_config = ServerConfig::from_env();
    let db_config = DatabaseConfig::from_env();

    // DATABASE_URL selects the backend; without it the service runs on the
    // ephemeral in-memory store
    let storage: Arc<dyn Storage> = if db_config.database_url.is_some() {
        let pool = init_pool(&db_config).await?;
        run_migrations(&pool, &postgres::MIGRATOR).await?;
        if health_check(&pool).await? {
            info!("database connection successful");
        }
        Arc::new(PgStorage::new(pool))
    } else {
        info!("DATABASE_URL is not set, using the in-memory store");
        Arc::new(MemStorage::new())
    };

    let state = AppState::new(storage, server_config);

    // Periodic sweep of expired sessions
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            match sessions.sweep().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "expired sessions swept"),
                Err(e) => error!("session sweep failed: {e}"),
            }
        }
    });

    let bind_addr = state.config.bind_addr.clone();
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
