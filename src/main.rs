use std::sync::Arc;

use axum_login::tower_sessions::ExpiredDeletion;
use maranatha_rs::{
    auth::credentials::StaticCredentials,
    config::Config,
    database::setup_database,
    router::{AppState, create_router, shutdown_signal},
};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    warn!("Sign-in accounts are a hardcoded list compared in plaintext");
    let credentials = Arc::new(StaticCredentials::default());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    match config.database_url.as_deref() {
        Some(db_url) => {
            let (db, pool) = setup_database(db_url).await?;
            let session_store = PostgresStore::new(pool);
            session_store.migrate().await?;

            let deletion_task = tokio::task::spawn(
                session_store
                    .clone()
                    .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
            );

            let state = AppState::new(Some(db), config.max_attendees);
            let app = create_router(state, credentials, session_store);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal(Some(deletion_task.abort_handle())))
                .await?;

            match deletion_task.await {
                Ok(result) => result?,
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(e.into()),
            }
        }
        None => {
            warn!("DATABASE_URL is not set; registration routes will answer 503");
            let state = AppState::new(None, config.max_attendees);
            let app = create_router(state, credentials, MemoryStore::default());
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal(None))
                .await?;
        }
    }

    Ok(())
}
