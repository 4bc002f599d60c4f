use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::{require_user, user::AuthSession},
    error::ApiError,
    qr::QrPayload,
    registrations::{RegistrationRecord, store},
    router::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub registration: RegistrationRecord,
    /// The registration had already been checked in before this scan.
    pub already_attended: bool,
}

/// Checks an attendee in from a pasted payload. Nothing changes unless the
/// payload decodes and names a stored registration.
pub async fn scan(
    State(state): State<AppState>,
    auth_session: AuthSession,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResult>, ApiError> {
    let operator = require_user(&auth_session)?;
    let db = state.db()?;

    let Json(ScanRequest { code }) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let code = code.filter(|c| !c.trim().is_empty()).ok_or_else(|| ApiError::Validation {
        message: "code is required".to_string(),
        fields: vec!["code"],
    })?;

    let decoded = QrPayload::decode(&code)?;
    let existing = store::find_by_id(db, &decoded.id)
        .await?
        .ok_or(ApiError::NotFound("registration"))?;

    let registration = store::set_attended(db, &existing.id, true)
        .await?
        .ok_or(ApiError::NotFound("registration"))?;

    info!(
        "{} checked in {} {}",
        operator.email, registration.first_name, registration.last_name
    );
    Ok(Json(ScanResult {
        registration,
        already_attended: existing.attended,
    }))
}
