use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::HeaderMap,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use doctor_cell::models::DoctorError;
use doctor_cell::services::DoctorService;
use shared_config::AppConfig;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_models::profile::{Profile, Role};
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_token as decode_token;

use crate::models::AccountProfile;

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(&headers)?;
    let user = decode_token(token, &config.supabase_jwt_secret)
        .map_err(|err| AppError::Auth(err.to_string()))?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_token(&headers)?;
    let valid = decode_token(token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(profile): Extension<Profile>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", profile.id);

    let doctor = if profile.role() == Some(Role::Doctor) {
        match DoctorService::new(&config)
            .get_doctor(&profile.id, auth.token())
            .await
        {
            Ok(detail) => Some(detail),
            Err(DoctorError::NotFound) => None,
            Err(err) => return Err(err.into()),
        }
    } else {
        None
    };

    Ok(Json(json!(AccountProfile::new(profile, doctor))))
}
