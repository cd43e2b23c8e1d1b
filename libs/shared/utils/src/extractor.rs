use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, TableQuery};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::profile::{Profile, Role};

use crate::jwt::validate_token;

/// Returns the raw token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_value = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// Validates the bearer token and stores the decoded [`User`] in the request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let user = validate_token(token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Loads the caller's clinic profile and stores it in the request extensions.
/// Must run after [`auth_middleware`].
pub async fn profile_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = extract_user(&request)?;
    let token = bearer_token(request.headers())?.to_string();

    let supabase = SupabaseClient::new(&config);
    let profile: Profile = supabase
        .select_one(&TableQuery::table("profiles").eq("id", &user.id), &token)
        .await
        .map_err(|e| AppError::database("Could not load the caller's profile", e))?
        .ok_or_else(|| AppError::Auth("No clinic profile for this account".to_string()))?;

    debug!("Caller {} has role {:?}", profile.id, profile.role());
    request.extensions_mut().insert(profile);

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

/// Fails with an authorization error unless the profile holds one of `allowed`
/// (administrators always pass).
pub fn require_role(profile: &Profile, allowed: &[Role]) -> Result<(), AppError> {
    if profile.has_any_role(allowed) {
        return Ok(());
    }

    let names: Vec<&str> = allowed.iter().map(|r| r.label()).collect();
    Err(AppError::Auth(format!(
        "This action is restricted to: {}",
        names.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_strips_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(bearer_token(&headers).is_err());
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn require_role_names_the_allowed_roles() {
        let patient = Profile {
            id: "p".into(),
            first_name: "Luis".into(),
            last_name: "Rojas".into(),
            id_role: Role::Patient.id(),
            avatar_url: None,
            phone: None,
            dni: None,
            birthday: None,
            email: None,
        };

        let err = require_role(&patient, &[Role::Doctor, Role::Nurse]).unwrap_err();
        assert_eq!(err.message(), "This action is restricted to: Doctor, Nurse");
        assert!(require_role(&patient, &[Role::Patient]).is_ok());
    }
}
