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

use crate::models::{MedicalHistoryRequest, PatientSearchQuery, PatientSearchResult, TriageRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<PatientSearchQuery>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Receptionist, Role::Nurse])?;

    let patient_service = PatientService::new(&state);
    let patients = patient_service
        .search_patients(&query.q, auth.token())
        .await
        .map_err(|e| AppError::database("Could not search patients", e))?;

    Ok(Json(json!(PatientSearchResult {
        total: patients.len(),
        patients,
    })))
}

#[axum::debug_handler]
pub async fn get_intake(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Nurse])?;

    let patient_service = PatientService::new(&state);
    let intake = patient_service
        .get_intake(&patient_id, auth.token())
        .await
        .map_err(|e| AppError::database("Could not load the patient intake", e))?;

    Ok(Json(json!(intake)))
}

#[axum::debug_handler]
pub async fn save_triage(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<TriageRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Nurse])?;

    let patient_service = PatientService::new(&state);
    let triage = patient_service
        .save_triage(&patient_id, request, auth.token())
        .await?;

    Ok(Json(json!(triage)))
}

#[axum::debug_handler]
pub async fn save_medical_history(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<MedicalHistoryRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Nurse])?;

    let patient_service = PatientService::new(&state);
    let history = patient_service
        .save_medical_history(&patient_id, request, auth.token())
        .await?;

    Ok(Json(json!(history)))
}
