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

use diagnosis_cell::diagnosis_routes;

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
async fn direct_route_reports_a_missing_key_after_both_layers() {
    let server = MockServer::start().await;
    let test_config = TestConfig::with_mock_server(&server.uri());
    let doctor = TestUser::doctor("neuro@clinic.test");
    let token = JwtTestUtils::create_test_token(&doctor, &test_config.jwt_secret, Some(1));
    mount_caller_profile(&server, &doctor).await;

    let request_body = json!({
        "data": { "history": {}, "triage": {}, "labs": [], "neuro": {} }
    });

    let response = diagnosis_routes(test_config.to_arc())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/openai")
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "OPENAI_API_KEY not configured");
}

#[tokio::test]
async fn forged_token_never_reaches_the_profile_lookup() {
    let server = MockServer::start().await;
    let test_config = TestConfig::with_mock_server(&server.uri());
    let doctor = TestUser::doctor("neuro@clinic.test");
    let token = JwtTestUtils::create_invalid_signature_token(&doctor);

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = diagnosis_routes(test_config.to_arc())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cases/case-1/consult")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
