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

use clinical_case_cell::case_routes;

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
async fn form_definition_is_served_through_both_layers() {
    let server = MockServer::start().await;
    let test_config = TestConfig::with_mock_server(&server.uri());
    let doctor = TestUser::doctor("neuro@clinic.test");
    let token = JwtTestUtils::create_test_token(&doctor, &test_config.jwt_secret, Some(1));
    mount_caller_profile(&server, &doctor).await;

    let response = case_routes(test_config.to_arc())
        .oneshot(
            Request::builder()
                .uri("/forms/motor")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["title"], "UHDRS Motor Assessment");
    assert_eq!(body["display_max"], 124);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(31));
}

#[tokio::test]
async fn account_without_clinic_profile_is_turned_away() {
    let server = MockServer::start().await;
    let test_config = TestConfig::with_mock_server(&server.uri());
    let stranger = TestUser::doctor("unknown@clinic.test");
    let token = JwtTestUtils::create_test_token(&stranger, &test_config.jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let response = case_routes(test_config.to_arc())
        .oneshot(
            Request::builder()
                .uri("/forms/motor")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "No clinic profile for this account");
}
