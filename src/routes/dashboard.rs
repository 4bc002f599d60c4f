use axum::{Json, extract::State};
use serde::Serialize;

use crate::{
    auth::{require_admin, user::AuthSession},
    error::ApiError,
    registrations::{RegistrationRecord, store},
    router::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total: u64,
    pub with_children: u64,
    pub attended: u64,
    /// Places left before the event is full.
    pub remaining: u64,
    pub registrations: Vec<RegistrationRecord>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    auth_session: AuthSession,
) -> Result<Json<Dashboard>, ApiError> {
    require_admin(&auth_session)?;
    let db = state.db()?;

    let counts = store::counts(db).await?;
    let registrations = store::list(db).await?;

    Ok(Json(Dashboard {
        total: counts.total,
        with_children: counts.with_children,
        attended: counts.attended,
        remaining: state.max_attendees.saturating_sub(counts.total),
        registrations,
    }))
}
