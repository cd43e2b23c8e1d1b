use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::profile::{Profile, Role};
use shared_utils::extractor::require_role;

use crate::models::DiagnosisRequest;
use crate::providers::{DiagnosisProvider, GeminiProvider, OpenAiProvider};
use crate::service::CaseDiagnosisService;

#[axum::debug_handler]
pub async fn openai_diagnosis(
    State(state): State<Arc<AppConfig>>,
    Extension(profile): Extension<Profile>,
    Json(request): Json<DiagnosisRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let suggestion = OpenAiProvider::new(&state).suggest(&request.data).await?;
    Ok(Json(json!(suggestion)))
}

#[axum::debug_handler]
pub async fn gemini_diagnosis(
    State(state): State<Arc<AppConfig>>,
    Extension(profile): Extension<Profile>,
    Json(request): Json<DiagnosisRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let suggestion = GeminiProvider::new(&state).suggest(&request.data).await?;
    Ok(Json(json!(suggestion)))
}

#[axum::debug_handler]
pub async fn consult_case(
    State(state): State<Arc<AppConfig>>,
    Path(case_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let diagnosis_service = CaseDiagnosisService::new(&state);
    let opinion = diagnosis_service
        .consult_case(&case_id, auth.token())
        .await?;

    Ok(Json(json!(opinion)))
}

#[axum::debug_handler]
pub async fn narrate_case(
    State(state): State<Arc<AppConfig>>,
    Path(case_id): Path<String>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    require_role(&profile, &[Role::Doctor])?;

    let diagnosis_service = CaseDiagnosisService::new(&state);
    let opinion = diagnosis_service
        .narrate_case(&case_id, auth.token())
        .await?;

    Ok(Json(json!(opinion)))
}
