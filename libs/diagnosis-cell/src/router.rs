use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, profile_middleware};

use crate::handlers;

pub fn diagnosis_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/openai", post(handlers::openai_diagnosis))
        .route("/gemini", post(handlers::gemini_diagnosis))
        .route("/cases/{case_id}/consult", post(handlers::consult_case))
        .route("/cases/{case_id}/narrative", post(handlers::narrate_case))
        .layer(middleware::from_fn_with_state(state.clone(), profile_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
