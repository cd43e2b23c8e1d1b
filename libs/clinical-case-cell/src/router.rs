use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, profile_middleware};

use crate::handlers;

pub fn case_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_case))
        .route("/forms/{form}", get(handlers::get_form_definition))
        .route("/{case_id}", get(handlers::get_case))
        .route("/{case_id}/anamnesis", put(handlers::save_anamnesis))
        .route(
            "/{case_id}/labs",
            get(handlers::list_labs).post(handlers::order_lab),
        )
        .route("/{case_id}/neurology", put(handlers::save_neurology))
        .route(
            "/{case_id}/neurology/forms/{form}",
            put(handlers::save_form),
        )
        .layer(middleware::from_fn_with_state(state.clone(), profile_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
