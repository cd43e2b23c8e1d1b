use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, profile_middleware};

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/search", get(handlers::search_patients))
        .route("/{patient_id}/intake", get(handlers::get_intake))
        .route("/{patient_id}/triage", post(handlers::save_triage))
        .route("/{patient_id}/medical-history", put(handlers::save_medical_history))
        .layer(middleware::from_fn_with_state(state.clone(), profile_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
