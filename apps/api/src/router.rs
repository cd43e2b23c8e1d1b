use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use clinical_case_cell::router::case_routes;
use diagnosis_cell::router::diagnosis_routes;
use doctor_cell::router::doctor_routes;
use patient_cell::router::patient_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "NeuroClinic API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/cases", case_routes(state.clone()))
        .nest("/ai", diagnosis_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_state() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            supabase_url: "http://localhost:54321".into(),
            supabase_anon_key: "anon".into(),
            supabase_jwt_secret: "secret".into(),
            openai_api_key: String::new(),
            openai_base_url: "http://localhost:54322".into(),
            openai_model: "gpt-4o".into(),
            openai_narrative_model: "gpt-4".into(),
            gemini_api_key: String::new(),
            gemini_base_url: "http://localhost:54323".into(),
            gemini_model: "gemini-2.5-flash".into(),
            clinic_utc_offset: "-05:00".into(),
            port: 3000,
        })
    }

    #[tokio::test]
    async fn root_answers_health_check() {
        let response = create_router(test_state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn every_cell_is_behind_authentication() {
        for uri in [
            "/auth/profile",
            "/doctors/specialties",
            "/appointments/agenda",
            "/patients/search?q=Rojas",
            "/cases/forms/motor",
        ] {
            let response = create_router(test_state())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn ai_routes_reject_anonymous_calls() {
        let response = create_router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ai/openai")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::json!({ "data": {} }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
