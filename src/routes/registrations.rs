use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{
    error::ApiError,
    qr::{QrPayload, render_pattern},
    registrations::{CreateRegistration, RegistrationRecord, store},
    router::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    qr: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QrArtifact {
    pub id: String,
    /// Text to present at check-in.
    pub payload: String,
    /// PNG data URI of the placeholder pattern.
    pub image: String,
}

pub async fn list_registrations(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegistrationRecord>>, ApiError> {
    let db = state.db()?;
    Ok(Json(store::list(db).await?))
}

pub async fn create_registration(
    State(state): State<AppState>,
    payload: Result<Json<CreateRegistration>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistrationRecord>), ApiError> {
    let db = state.db()?;
    let Json(request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let mut record = request.into_record()?;

    if store::count(db).await? >= state.max_attendees {
        return Err(ApiError::Capacity(state.max_attendees));
    }

    if record.qr_code.is_empty() {
        let payload = QrPayload::from(&record)
            .encode()
            .map_err(|e| ApiError::Internal(e.into()))?;
        record.qr_code = render_pattern(&payload).map_err(|e| ApiError::Internal(e.into()))?;
    }

    let stored = store::insert(db, &record).await?;
    info!(
        "Registered {} {} ({} children)",
        stored.first_name,
        stored.last_name,
        stored.children.len()
    );
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `?qr=true` looks the path segment up as a stored QR value instead of an id.
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<RegistrationRecord>, ApiError> {
    let db = state.db()?;
    let by_qr_code = query.qr.as_deref() == Some("true");

    let registration = if by_qr_code {
        store::find_by_qr_code(db, &id).await?
    } else {
        store::find_by_id(db, &id).await?
    };

    registration
        .map(Json)
        .ok_or(ApiError::NotFound("registration"))
}

pub async fn update_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RegistrationRecord>, ApiError> {
    let db = state.db()?;
    let attended = payload
        .ok()
        .and_then(|Json(body)| body.get("attended").and_then(Value::as_bool))
        .ok_or_else(|| ApiError::Validation {
            message: "\"attended\" must be a boolean".to_string(),
            fields: vec!["attended"],
        })?;

    let updated = store::set_attended(db, &id, attended)
        .await?
        .ok_or(ApiError::NotFound("registration"))?;
    info!("Registration {} attended = {}", updated.id, updated.attended);
    Ok(Json(updated))
}

/// The check-in payload and pattern image, rebuilt from the stored record.
pub async fn get_qr(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QrArtifact>, ApiError> {
    let db = state.db()?;
    let record = store::find_by_id(db, &id)
        .await?
        .ok_or(ApiError::NotFound("registration"))?;

    let payload = QrPayload::from(&record)
        .encode()
        .map_err(|e| ApiError::Internal(e.into()))?;
    let image = render_pattern(&payload).map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Json(QrArtifact {
        id: record.id,
        payload,
        image,
    }))
}
