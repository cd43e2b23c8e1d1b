use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
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

use crate::models::{
    CaseError, CreateCaseRequest, FormScoresRequest, GeneralConsultation, LabOrderForm,
    LabOrderRequest, NeurologyUpdateRequest,
};
use crate::scoring::AssessmentForm;
use crate::services::{CaseService, LabService, NeurologyService};

fn parse_form(slug: &str) -> Result<AssessmentForm, CaseError> {
    AssessmentForm::from_slug(slug).ok_or_else(|| CaseError::UnknownForm(slug.to_string()))
}

#[axum::debug_handler]
pub async fn create_case(
    State(state): State<Arc<AppConfig>>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&profile, &[Role::Receptionist])?;

    let case_service = CaseService::new(&state);
    let case = case_service.create_case(request, auth.token()).await?;

    Ok((StatusCode::CREATED, Json(json!(case))))
}

#[axum::debug_handler]
pub async fn get_form_definition(
    Path(form): Path<String>,
    Extension(profile): Extension<Profile>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let form = parse_form(&form)?;
    Ok(Json(json!(form.definition())))
}

#[axum::debug_handler]
pub async fn get_case(
    State(state): State<Arc<AppConfig>>,
    Path(case_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let case_service = CaseService::new(&state);
    let detail = case_service.get_case_detail(&case_id, auth.token()).await?;

    Ok(Json(json!(detail)))
}

#[axum::debug_handler]
pub async fn save_anamnesis(
    State(state): State<Arc<AppConfig>>,
    Path(case_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(anamnesis): Json<GeneralConsultation>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let case_service = CaseService::new(&state);
    let saved = case_service
        .save_anamnesis(&case_id, anamnesis, auth.token())
        .await?;

    Ok(Json(json!(saved)))
}

#[axum::debug_handler]
pub async fn list_labs(
    State(state): State<Arc<AppConfig>>,
    Path(case_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let lab_service = LabService::new(&state);
    let labs = lab_service
        .list_labs(&case_id, auth.token())
        .await
        .map_err(|e| AppError::database("Could not load lab results", e))?;

    Ok(Json(json!({
        "total": labs.len(),
        "labs": labs,
    })))
}

#[axum::debug_handler]
pub async fn order_lab(
    State(state): State<Arc<AppConfig>>,
    Path(case_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<LabOrderRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let lab_service = LabService::new(&state);
    let mut form = LabOrderForm::from(request);
    let labs = form.submit(&lab_service, &case_id, auth.token()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "total": labs.len(),
            "labs": labs,
        })),
    ))
}

#[axum::debug_handler]
pub async fn save_neurology(
    State(state): State<Arc<AppConfig>>,
    Path(case_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<NeurologyUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let neurology_service = NeurologyService::new(&state);
    let assessment = neurology_service
        .save_assessment(&case_id, &profile.id, request, auth.token())
        .await?;

    Ok(Json(json!(assessment)))
}

#[axum::debug_handler]
pub async fn save_form(
    State(state): State<Arc<AppConfig>>,
    Path((case_id, form)): Path<(String, String)>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<FormScoresRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let form = parse_form(&form)?;
    let neurology_service = NeurologyService::new(&state);
    let result = neurology_service
        .save_form(&case_id, &profile.id, form, request.scores, auth.token())
        .await?;

    Ok(Json(json!(result)))
}
