use assert_matches::assert_matches;
use axum::{
    body::Body,
    extract::{Extension, Path, Query, State},
    http::{Request, StatusCode},
};
use axum_extra::TypedHeader;
use chrono::{FixedOffset, NaiveDate, TimeZone};
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::handlers::*;
use doctor_cell::models::{DoctorError, DoctorListQuery, SlotsQuery};
use doctor_cell::router::doctor_routes;
use doctor_cell::services::AvailabilityService;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(token).unwrap())
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn mount_doctor_detail(server: &MockServer, doctor_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_details"))
        .and(query_param("profile_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_detail_response(doctor_id, "Salas")
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn week_slots_skip_booked_appointments() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    mount_doctor_detail(&server, "doc-1").await;

    // The booked range covers Sunday 00:00 to Saturday 23:59:59 in Lima.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.doc-1"))
        .and(query_param("scheduled_at", "gte.2030-01-06T05:00:00.000Z"))
        .and(query_param("scheduled_at", "lte.2030-01-13T04:59:59.000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "scheduled_at": "2030-01-07T15:00:00+00:00" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&config);
    let now = FixedOffset::west_opt(5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2030, 1, 1, 8, 0, 0)
        .unwrap();

    let week = service
        .get_week_slots_at("doc-1", Some(day(2030, 1, 7)), now, "token")
        .await
        .unwrap();

    assert_eq!((week.first_day, week.last_day), (day(2030, 1, 6), day(2030, 1, 12)));
    assert_eq!(week.previous_week, day(2029, 12, 31));
    assert_eq!(week.next_week, day(2030, 1, 14));

    let labels: Vec<_> = week
        .slots
        .iter()
        .map(|s| (s.date, s.time.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            (day(2030, 1, 7), "09:00"),
            (day(2030, 1, 7), "11:00"),
            (day(2030, 1, 9), "14:00"),
            (day(2030, 1, 9), "15:00"),
        ]
    );
    assert_eq!(week.total_slots, 4);
}

#[tokio::test]
async fn missing_doctor_is_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = AvailabilityService::new(&config)
        .get_week_slots("ghost", Some(day(2030, 1, 7)), "token")
        .await;

    assert_matches!(result, Err(DoctorError::NotFound));
}

#[tokio::test]
async fn slots_handler_is_for_reception() {
    let config = TestConfig::default().to_arc();
    let patient = TestUser::patient("patient@clinic.test");

    let result = get_week_slots(
        State(config),
        Path("doc-1".to_string()),
        Query(SlotsQuery { week_start: None }),
        Extension(patient.to_profile()),
        auth_header("token"),
    )
    .await;

    assert_matches!(result, Err(AppError::Auth(_)));
}

#[tokio::test]
async fn slots_handler_returns_the_week() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();
    let receptionist = TestUser::receptionist("front@clinic.test");

    mount_doctor_detail(&server, "doc-1").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let response = get_week_slots(
        State(config),
        Path("doc-1".to_string()),
        Query(SlotsQuery { week_start: Some(day(2030, 1, 7)) }),
        Extension(receptionist.to_profile()),
        auth_header("token"),
    )
    .await
    .unwrap();

    assert_eq!(response.0["doctor_id"], "doc-1");
    assert_eq!(response.0["week_start"], "2030-01-07");
    assert_eq!(response.0["next_week"], "2030-01-14");
    assert_eq!(response.0["total_slots"], 5);
}

#[tokio::test]
async fn doctor_list_filters_by_name_after_fetch() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_details"))
        .and(query_param("specialty_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_detail_response("doc-1", "Salas"),
            MockSupabaseResponses::doctor_detail_response("doc-2", "Quispe"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = list_doctors(
        State(config),
        Query(DoctorListQuery {
            specialty_id: 1,
            search: Some("quis".to_string()),
        }),
        auth_header("token"),
    )
    .await
    .unwrap();

    assert_eq!(response.0["total"], 1);
    assert_eq!(response.0["doctors"][0]["profile_id"], "doc-2");
}

#[tokio::test]
async fn store_failures_surface_as_database_errors() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_specialties"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(MockSupabaseResponses::error_response("boom", "XX000")),
        )
        .mount(&server)
        .await;

    let result = list_specialties(State(config), auth_header("token")).await;

    assert_matches!(result, Err(AppError::Database(msg)) if msg == "Could not load specialties");
}

#[tokio::test]
async fn router_loads_the_caller_profile_before_handlers() {
    let server = MockServer::start().await;
    let test_config = TestConfig::with_mock_server(&server.uri());
    let receptionist = TestUser::receptionist("front@clinic.test");
    let token = JwtTestUtils::create_test_token(&receptionist, &test_config.jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", receptionist.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::profile_response(&receptionist)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_specialties"))
        .and(query_param("status", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "specialty": "Neurología", "status": true }
        ])))
        .mount(&server)
        .await;

    let app = doctor_routes(test_config.to_arc());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/specialties")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["specialties"][0]["specialty"], "Neurología");
}

#[tokio::test]
async fn router_rejects_missing_tokens() {
    let app = doctor_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(Request::builder().uri("/specialties").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
