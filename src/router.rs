use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use axum_login::{
    AuthManagerLayerBuilder,
    tower_sessions::{Expiry, SessionManagerLayer, SessionStore, cookie::SameSite},
};
use sea_orm::DatabaseConnection;
use tokio::{signal, task::AbortHandle};
use tower_http::trace::TraceLayer;

use crate::{
    auth::{credentials::CredentialProvider, router as auth_router, user::Backend},
    error::ApiError,
    routes::{
        dashboard::dashboard,
        health::health,
        registrations::{
            create_registration, get_qr, get_registration, list_registrations, update_attendance,
        },
        scan::scan,
    },
};

#[derive(Clone)]
pub struct AppState {
    db: Option<DatabaseConnection>,
    pub max_attendees: u64,
}

impl AppState {
    pub fn new(db: Option<DatabaseConnection>, max_attendees: u64) -> Self {
        Self { db, max_attendees }
    }

    /// The connection, or the "not configured" error every data route
    /// reports when the service runs without a database.
    pub fn db(&self) -> Result<&DatabaseConnection, ApiError> {
        self.db.as_ref().ok_or(ApiError::StorageUnavailable)
    }

    pub fn has_storage(&self) -> bool {
        self.db.is_some()
    }
}

pub fn create_router<Store>(
    state: AppState,
    credentials: Arc<dyn CredentialProvider>,
    session_store: Store,
) -> Router
where
    Store: SessionStore + Clone,
{
    // No max-age: the cookie lives until the browser session ends or the
    // user logs out.
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnSessionEnd);

    // Auth service.
    //
    // This combines the session layer with our backend to establish the auth
    // service which will provide the auth session as a request extension.
    let backend = Backend::new(credentials);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    Router::new()
        .route(
            "/registrations",
            get(list_registrations).post(create_registration),
        )
        .route(
            "/registrations/{id}",
            get(get_registration).patch(update_attendance),
        )
        .route("/registrations/{id}/qr", get(get_qr))
        .route("/scan", post(scan))
        .route("/dashboard", get(dashboard))
        .route("/health", get(health))
        .merge(auth_router::router())
        .with_state(state)
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
}

pub async fn shutdown_signal(deletion_task_abort_handle: Option<AbortHandle>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    if let Some(handle) = deletion_task_abort_handle {
        handle.abort();
    }
}
