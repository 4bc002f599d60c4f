use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_login::tower_sessions::Session;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    credentials::{AdminUser, Role},
    is_valid_email, require_user,
    user::{AuthSession, Credentials},
};
use crate::{error::ApiError, router::AppState};

pub const LOGGED_IN_AT_KEY: &str = "auth.logged-in-at";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    /// Unix epoch milliseconds.
    pub logged_in_at: Option<i64>,
}

impl Identity {
    fn new(user: &AdminUser, logged_in_at: Option<i64>) -> Self {
        Self {
            email: user.email.clone(),
            role: user.role,
            is_admin: user.is_admin(),
            logged_in_at,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(self::post::login))
        .route("/logout", get(self::get::logout))
        .route("/me", get(self::get::me))
}

mod post {
    use super::*;

    pub async fn login(
        mut auth_session: AuthSession,
        session: Session,
        payload: Result<Json<LoginRequest>, JsonRejection>,
    ) -> Result<Json<Identity>, ApiError> {
        let Json(LoginRequest { email, password }) =
            payload.map_err(|e| ApiError::validation(e.body_text()))?;

        let email = email.unwrap_or_default();
        let password = password.unwrap_or_default();
        if email.trim().is_empty() {
            return Err(ApiError::Validation {
                message: "email is required".to_string(),
                fields: vec!["email"],
            });
        }
        if !is_valid_email(email.trim()) {
            return Err(ApiError::Validation {
                message: "email is not valid".to_string(),
                fields: vec!["email"],
            });
        }
        if password.trim().is_empty() {
            return Err(ApiError::Validation {
                message: "password is required".to_string(),
                fields: vec!["password"],
            });
        }

        let creds = Credentials {
            email: email.trim().to_string(),
            password,
        };
        let user = match auth_session.authenticate(creds).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Rejected login attempt");
                return Err(ApiError::InvalidCredentials);
            }
            Err(e) => return Err(ApiError::Internal(anyhow::Error::new(e))),
        };

        auth_session
            .login(&user)
            .await
            .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;

        let logged_in_at = Utc::now().timestamp_millis();
        session
            .insert(LOGGED_IN_AT_KEY, logged_in_at)
            .await
            .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;

        info!("{} signed in as {:?}", user.email, user.role);
        Ok(Json(Identity::new(&user, Some(logged_in_at))))
    }
}

mod get {
    use super::*;

    pub async fn logout(mut auth_session: AuthSession) -> impl IntoResponse {
        if let Err(e) = auth_session.logout().await {
            warn!("Failed to clear session on logout: {e}");
        }
        StatusCode::NO_CONTENT
    }

    pub async fn me(
        auth_session: AuthSession,
        session: Session,
    ) -> Result<Json<Identity>, ApiError> {
        let user = require_user(&auth_session)?;
        let logged_in_at = session
            .get::<i64>(LOGGED_IN_AT_KEY)
            .await
            .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;
        Ok(Json(Identity::new(user, logged_in_at)))
    }
}
