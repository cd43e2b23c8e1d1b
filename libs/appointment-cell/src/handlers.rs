// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::profile::{Profile, Role};
use shared_utils::extractor::require_role;

use crate::models::BookAppointmentRequest;
use crate::services::BookingService;

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&profile, &[Role::Receptionist])?;

    let booking_service = BookingService::new(&state);
    let appointment = booking_service
        .book_appointment(request, auth.token())
        .await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

/// The calling doctor's appointments.
#[axum::debug_handler]
pub async fn get_agenda(
    State(state): State<Arc<AppConfig>>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let booking_service = BookingService::new(&state);
    let appointments = booking_service
        .get_agenda(&profile.id, auth.token())
        .await
        .map_err(|e| AppError::database("Could not load the agenda", e))?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_patient_summary(
    State(state): State<Arc<AppConfig>>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Patient])?;

    let booking_service = BookingService::new(&state);
    let summary = booking_service
        .get_patient_summary(&profile.id, auth.token())
        .await;

    Ok(Json(json!(summary)))
}
