use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

use appointment_cell::router::appointment_routes;

async fn mount_caller_profile(server: &MockServer, caller: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", caller.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::profile_response(caller)
        ])))
        .expect(1)
        .mount(server)
        .await;
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn agenda_is_refused_to_nurses_after_the_profile_loads() {
    let server = MockServer::start().await;
    let test_config = TestConfig::with_mock_server(&server.uri());
    let nurse = TestUser::nurse("nurse@clinic.test");
    let token = JwtTestUtils::create_test_token(&nurse, &test_config.jwt_secret, Some(1));
    mount_caller_profile(&server, &nurse).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = appointment_routes(test_config.to_arc())
        .oneshot(
            Request::builder()
                .uri("/agenda")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "This action is restricted to: Doctor");
}

#[tokio::test]
async fn expired_token_stops_at_the_auth_layer() {
    let server = MockServer::start().await;
    let test_config = TestConfig::with_mock_server(&server.uri());
    let doctor = TestUser::doctor("neuro@clinic.test");
    let token = JwtTestUtils::create_expired_token(&doctor, &test_config.jwt_secret);

    let response = appointment_routes(test_config.to_arc())
        .oneshot(
            Request::builder()
                .uri("/agenda")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Token expired");
}
