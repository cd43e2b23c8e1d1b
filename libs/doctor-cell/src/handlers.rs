use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::profile::{Profile, Role};
use shared_utils::extractor::require_role;

use crate::models::{DoctorListQuery, SlotsQuery};
use crate::services::{AvailabilityService, DoctorService};

#[axum::debug_handler]
pub async fn list_specialties(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let specialties = doctor_service
        .list_specialties(auth.token())
        .await
        .map_err(|e| AppError::database("Could not load specialties", e))?;

    Ok(Json(json!({
        "specialties": specialties,
        "total": specialties.len(),
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors = doctor_service
        .list_doctors(query.specialty_id, query.search.as_deref(), auth.token())
        .await
        .map_err(|e| AppError::database("Could not load doctors", e))?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service.get_doctor(&doctor_id, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

/// Open hourly slots of one week, for the receptionist's booking screen.
#[axum::debug_handler]
pub async fn get_week_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotsQuery>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Receptionist])?;

    let availability_service = AvailabilityService::new(&state);

    let week = availability_service
        .get_week_slots(&doctor_id, query.week_start, auth.token())
        .await?;

    Ok(Json(json!(week)))
}
