use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::profile::{Profile, Role};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            openai_api_key: String::new(),
            openai_base_url: "http://localhost:54322".to_string(),
            gemini_api_key: String::new(),
            gemini_base_url: "http://localhost:54323".to_string(),
        }
    }
}

impl TestConfig {
    /// Points the store and both model providers at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            openai_base_url: uri.to_string(),
            gemini_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn with_llm_keys(mut self) -> Self {
        self.openai_api_key = "test-openai-key".to_string();
        self.gemini_api_key = "test-gemini-key".to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            openai_api_key: self.openai_api_key.clone(),
            openai_base_url: self.openai_base_url.clone(),
            openai_model: "gpt-4o".to_string(),
            openai_narrative_model: "gpt-4".to_string(),
            gemini_api_key: self.gemini_api_key.clone(),
            gemini_base_url: self.gemini_base_url.clone(),
            gemini_model: "gemini-2.5-flash".to_string(),
            clinic_utc_offset: "-05:00".to_string(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("patient@example.com", Role::Patient)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
            first_name: "Test".to_string(),
            last_name: role.label().to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn nurse(email: &str) -> Self {
        Self::new(email, Role::Nurse)
    }

    pub fn receptionist(email: &str) -> Self {
        Self::new(email, Role::Receptionist)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some("authenticated".to_string()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn to_profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            id_role: self.role.id(),
            avatar_url: None,
            phone: None,
            dni: None,
            birthday: None,
            email: Some(self.email.clone()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Row fixtures shaped like the clinic's PostgREST responses.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn profile_response(user: &TestUser) -> serde_json::Value {
        json!({
            "id": user.id,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "id_role": user.role.id(),
            "avatar_url": null,
            "phone": "999888777",
            "dni": "45678912",
            "birthday": "1979-03-02",
            "email": user.email
        })
    }

    pub fn patient_profile_response(id: &str, first_name: &str, last_name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "first_name": first_name,
            "last_name": last_name,
            "id_role": 3,
            "dni": "40404040",
            "birthday": "1975-01-20"
        })
    }

    pub fn doctor_detail_response(profile_id: &str, last_name: &str) -> serde_json::Value {
        json!({
            "profile_id": profile_id,
            "specialty_id": 1,
            "cmp_code": "CMP-012345",
            "available_hours": {
                "Lunes": [{ "start_time": "09:00", "end_time": "12:00" }],
                "Miercoles": [{ "start_time": "14:00", "end_time": "16:00" }]
            },
            "specialty": { "specialty": "Neurología" },
            "profile": {
                "id": profile_id,
                "first_name": "Carmen",
                "last_name": last_name,
                "avatar_url": null
            }
        })
    }

    pub fn clinical_case_response(id: &str, patient_id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "code_case": "HD-2026-001",
            "status": 1,
            "is_active": true
        })
    }

    pub fn appointment_response(patient_id: &str, doctor_id: &str, scheduled_at: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "scheduled_at": scheduled_at,
            "status": 1,
            "type": 1,
            "case_id": null
        })
    }

    pub fn lab_result_response(case_id: &str, lab_type: &str, status: bool) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "case_id": case_id,
            "type": lab_type,
            "description": "CAG repeat count",
            "results_json": if status { json!({ "cag_repeats": 43 }) } else { json!(null) },
            "result_text": if status { json!("43 CAG repeats on the expanded allele") } else { json!(null) },
            "analyzed_at": null,
            "status": status,
            "created_at": "2026-10-01T15:00:00+00:00"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
