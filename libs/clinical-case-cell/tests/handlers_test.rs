use std::collections::BTreeMap;

use assert_matches::assert_matches;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use wiremock::matchers::{any, body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinical_case_cell::handlers::*;
use clinical_case_cell::models::{
    section, CaseError, CreateCaseRequest, FormScoresRequest, LabOrderForm, LabOrderRequest,
    NeurologyUpdateRequest,
};
use clinical_case_cell::scoring::{AssessmentForm, FunctionalStage};
use clinical_case_cell::services::{CaseService, LabService, NeurologyService};
use shared_models::error::AppError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

const GENETICS: &str = "Genética y Biología Molecular";

fn auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(token).unwrap())
}

async fn mount_case(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinical_cases"))
        .and(query_param("id", "eq.case-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::clinical_case_response("case-1", "pat-1")
        ])))
        .mount(server)
        .await;
}

async fn mount_empty(server: &MockServer, table: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{}", table)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn blank_lab_description_never_reaches_the_store() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut form = LabOrderForm {
        lab_type: GENETICS.to_string(),
        description: "   ".to_string(),
    };
    let result = form
        .submit(&LabService::new(&config), "case-1", "token")
        .await;

    assert_matches!(result, Err(CaseError::Validation(_)));
    assert_eq!(form.description, "   ");
}

#[tokio::test]
async fn lab_order_inserts_once_clears_and_refetches() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/rest/v1/lab_results"))
        .and(body_json(json!({
            "case_id": "case-1",
            "type": GENETICS,
            "description": "CAG repeat count",
            "status": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::lab_result_response("case-1", GENETICS, false)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_results"))
        .and(query_param("case_id", "eq.case-1"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::lab_result_response("case-1", GENETICS, false),
            MockSupabaseResponses::lab_result_response("case-1", "Bioquímica y Hematología", true)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut form = LabOrderForm {
        lab_type: GENETICS.to_string(),
        description: " CAG repeat count ".to_string(),
    };
    let labs = form
        .submit(&LabService::new(&config), "case-1", "token")
        .await
        .unwrap();

    assert_eq!(labs.len(), 2);
    assert!(labs[0].is_genetic());
    assert!(form.description.is_empty());
    assert_eq!(form.lab_type, GENETICS);
}

#[tokio::test]
async fn lab_order_handler_answers_created_with_the_list() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();
    let doctor = TestUser::doctor("neuro@clinic.test");

    Mock::given(method("POST"))
        .and(path("/rest/v1/lab_results"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::lab_result_response("case-1", GENETICS, false)
        ])))
        .mount(&server)
        .await;

    let (status, Json(body)) = order_lab(
        State(config),
        Path("case-1".to_string()),
        Extension(doctor.to_profile()),
        auth_header("token"),
        Json(LabOrderRequest {
            lab_type: GENETICS.to_string(),
            description: "HTT genotyping".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"], 1);
    assert_eq!(body["labs"][0]["status"], false);
}

#[tokio::test]
async fn case_detail_reports_sections_that_failed() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    mount_case(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.pat-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_profile_response("pat-1", "Luis", "Rojas")
        ])))
        .mount(&server)
        .await;
    mount_empty(&server, "medical_histories").await;
    mount_empty(&server, "triage_records").await;
    mount_empty(&server, "general_consultations").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_results"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(MockSupabaseResponses::error_response("boom", "XX000")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/neurology_assessments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "case_id": "case-1", "has_chorea": true, "uhdrs_motor_score": "38" }
        ])))
        .mount(&server)
        .await;

    let detail = CaseService::new(&config)
        .get_case_detail("case-1", "token")
        .await
        .unwrap();

    assert_eq!(detail.case.code_case, "HD-2026-001");
    assert_eq!(detail.patient.unwrap().full_name(), "Luis Rojas");
    assert!(detail.labs.is_empty());
    assert_eq!(detail.unavailable_sections, vec![section::LABS]);
    assert_eq!(detail.neurology.unwrap().uhdrs_motor_score, Some(38));
}

#[tokio::test]
async fn unknown_case_is_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    mount_empty(&server, "clinical_cases").await;

    let result = CaseService::new(&config)
        .get_case_detail("case-404", "token")
        .await;

    assert_matches!(result, Err(CaseError::NotFound));
}

#[tokio::test]
async fn reception_opens_active_cases() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();
    let receptionist = TestUser::receptionist("front@clinic.test");

    Mock::given(method("POST"))
        .and(path("/rest/v1/clinical_cases"))
        .and(body_json(json!({
            "patient_id": "pat-1",
            "code_case": "HD-2026-001",
            "status": 1,
            "is_active": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::clinical_case_response("case-1", "pat-1")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, Json(body)) = create_case(
        State(config),
        Extension(receptionist.to_profile()),
        auth_header("token"),
        Json(CreateCaseRequest {
            patient_id: Some("pat-1".to_string()),
            code_case: Some("HD-2026-001".to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "case-1");
}

#[tokio::test]
async fn nurses_cannot_read_case_detail() {
    let config = TestConfig::default().to_arc();
    let nurse = TestUser::nurse("nurse@clinic.test");

    let result = get_case(
        State(config),
        Path("case-1".to_string()),
        Extension(nurse.to_profile()),
        auth_header("token"),
    )
    .await;

    assert_matches!(result, Err(AppError::Auth(_)));
}

#[tokio::test]
async fn neurology_save_turns_unparseable_scores_into_zero() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/rest/v1/neurology_assessments"))
        .and(query_param("on_conflict", "case_id"))
        .and(body_partial_json(json!({
            "case_id": "case-1",
            "doctor_id": "doc-1",
            "has_chorea": true,
            "uhdrs_motor_score": 0,
            "mmse_score": 24,
            "diagnosis": "Huntington's disease"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "case_id": "case-1", "has_chorea": true, "uhdrs_motor_score": 0, "mmse_score": 24 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let request: NeurologyUpdateRequest = serde_json::from_value(json!({
        "has_chorea": true,
        "uhdrs_motor_score": "n/a",
        "mmse_score": "24",
        "diagnosis": "Huntington's disease"
    }))
    .unwrap();

    let saved = NeurologyService::new(&config)
        .save_assessment("case-1", "doc-1", request, "token")
        .await
        .unwrap();

    assert_eq!(saved.mmse_score, Some(24));
}

#[tokio::test]
async fn functional_form_saves_total_and_stage() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();
    let doctor = TestUser::doctor("neuro@clinic.test");

    Mock::given(method("POST"))
        .and(path("/rest/v1/neurology_assessments"))
        .and(query_param("on_conflict", "case_id"))
        .and(body_partial_json(json!({
            "case_id": "case-1",
            "fc_info": { "occupation": 2, "finances": 2, "chores": 1, "adl": 3, "care_level": 2 },
            "fc_score": 10
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "case_id": "case-1" }])))
        .expect(1)
        .mount(&server)
        .await;

    let scores: BTreeMap<String, i32> = [
        ("occupation", 2),
        ("finances", 2),
        ("chores", 1),
        ("adl", 3),
        ("care_level", 2),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let Json(body) = save_form(
        State(config),
        Path(("case-1".to_string(), "functional".to_string())),
        Extension(doctor.to_profile()),
        auth_header("token"),
        Json(FormScoresRequest { scores }),
    )
    .await
    .unwrap();

    assert_eq!(body["total"], 10);
    assert_eq!(body["display_max"], 13);
    assert_eq!(body["stage"], json!(FunctionalStage::II));
}

#[tokio::test]
async fn cognitive_form_is_clamped_before_saving() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/rest/v1/neurology_assessments"))
        .and(body_partial_json(json!({
            "mmse_info": { "ori_time": 5, "recall": 1 },
            "mmse_score": 6
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "case_id": "case-1" }])))
        .expect(1)
        .mount(&server)
        .await;

    let scores = [("ori_time".to_string(), 12), ("recall".to_string(), 1)]
        .into_iter()
        .collect();

    let result = NeurologyService::new(&config)
        .save_form("case-1", "doc-1", AssessmentForm::Cognitive, scores, "token")
        .await
        .unwrap();

    assert_eq!(result.total, 6);
    assert_eq!(result.cognitive_decline, Some(true));
    assert!(result.stage.is_none());
}

#[tokio::test]
async fn unknown_form_slug_is_not_found() {
    let doctor = TestUser::doctor("neuro@clinic.test");

    let result = get_form_definition(Path("uhdrs".to_string()), Extension(doctor.to_profile())).await;
    assert_matches!(result, Err(AppError::NotFound(_)));

    let Json(body) = get_form_definition(Path("motor".to_string()), Extension(doctor.to_profile()))
        .await
        .unwrap();
    assert_eq!(body["display_max"], 124);
    assert_eq!(body["items"].as_array().unwrap().len(), 31);
}
