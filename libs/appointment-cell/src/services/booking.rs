// libs/appointment-cell/src/services/booking.rs
use anyhow::Result;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use doctor_cell::models::DoctorError;
use doctor_cell::services::DoctorService;
use shared_config::AppConfig;
use shared_database::{SupabaseClient, TableQuery};

use crate::models::{
    kind, status, AgendaEntry, Appointment, AppointmentError, BookAppointmentRequest,
    CaseStatusRow, Notification, PatientSummary, UpcomingAppointment, CASE_STATUS_UNAVAILABLE,
    NO_ACTIVE_CASE, NO_CASE_STATUS,
};

const AGENDA_COLUMNS: &str = "id,
    scheduled_at,
    case_id,
    type:type_appointment(type),
    status:appointment_status(appointment_status),
    patient:profiles!patient_id(id,first_name,last_name)";

const UPCOMING_COLUMNS: &str = "scheduled_at,
    doctor:profiles!doctor_id(first_name,last_name),
    type:type_appointment(type)";

pub struct BookingService {
    supabase: SupabaseClient,
    doctors: DoctorService,
    offset: FixedOffset,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
            offset: config.clinic_offset(),
        }
    }

    /// Books a pending first visit and leaves the patient a reminder.
    ///
    /// The two inserts are not atomic: when the reminder fails the
    /// appointment stays booked and the failure is only logged.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let booking = request.validate()?;
        info!(
            "Booking appointment for patient {} with doctor {} at {}",
            booking.patient_id, booking.doctor_id, booking.scheduled_at
        );

        let doctor = self
            .doctors
            .get_doctor(&booking.doctor_id, auth_token)
            .await
            .map_err(|e| match e {
                DoctorError::NotFound => AppointmentError::DoctorNotFound,
                DoctorError::Store(e) => AppointmentError::Store(e),
            })?;

        let rows: Vec<Appointment> = self
            .supabase
            .insert(
                "appointments",
                json!({
                    "doctor_id": booking.doctor_id,
                    "patient_id": booking.patient_id,
                    "scheduled_at": booking.scheduled_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                    "status": status::PENDING,
                    "type": kind::FIRST_VISIT,
                }),
                auth_token,
            )
            .await
            .map_err(AppointmentError::Booking)?;

        let appointment = rows.into_iter().next().ok_or_else(|| {
            AppointmentError::Booking(anyhow::anyhow!("Insert returned no appointment row"))
        })?;

        let reminder = self.reminder_for(
            &booking.patient_id,
            doctor.last_name().unwrap_or_default(),
            booking.scheduled_at,
        );

        if let Err(e) = self.send_notification(&reminder, auth_token).await {
            warn!(
                "Appointment {} booked but the reminder for {} failed: {}",
                appointment.id, booking.patient_id, e
            );
        }

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    pub fn reminder_for(
        &self,
        patient_id: &str,
        doctor_last_name: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Notification {
        let local = scheduled_at.with_timezone(&self.offset);

        Notification {
            user_id: patient_id.to_string(),
            title: "Appointment Reminder".to_string(),
            message: format!(
                "You have an appointment with Dr. {} on {} at {}",
                doctor_last_name,
                local.format("%Y-%m-%d"),
                local.format("%H:%M")
            ),
            created_at: Utc::now(),
        }
    }

    async fn send_notification(&self, notification: &Notification, auth_token: &str) -> Result<()> {
        debug!("Sending notification to {}", notification.user_id);

        let _: Vec<serde_json::Value> = self
            .supabase
            .insert("notifications", json!(notification), auth_token)
            .await?;

        Ok(())
    }

    /// All of a doctor's appointments, earliest first.
    pub async fn get_agenda(&self, doctor_id: &str, auth_token: &str) -> Result<Vec<AgendaEntry>> {
        debug!("Fetching agenda for doctor {}", doctor_id);

        self.supabase
            .select(
                &TableQuery::table("appointments")
                    .select(AGENDA_COLUMNS)
                    .eq("doctor_id", doctor_id)
                    .order("scheduled_at", true),
                auth_token,
            )
            .await
    }

    /// Active case status and next appointment of a patient, loaded together.
    pub async fn get_patient_summary(&self, patient_id: &str, auth_token: &str) -> PatientSummary {
        let (case_status, next_appointment) = futures::join!(
            self.active_case_status(patient_id, auth_token),
            self.next_appointment(patient_id, Utc::now(), auth_token),
        );

        let case_status = match case_status {
            Ok(Some(row)) => row
                .status
                .map(|s| s.case_status)
                .unwrap_or_else(|| NO_CASE_STATUS.to_string()),
            Ok(None) => NO_ACTIVE_CASE.to_string(),
            Err(e) => {
                warn!("Could not load case status for {}: {}", patient_id, e);
                CASE_STATUS_UNAVAILABLE.to_string()
            }
        };

        let next_appointment = next_appointment.unwrap_or_else(|e| {
            warn!("Could not load next appointment for {}: {}", patient_id, e);
            None
        });

        PatientSummary {
            case_status,
            next_appointment,
        }
    }

    async fn active_case_status(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Option<CaseStatusRow>> {
        self.supabase
            .select_one(
                &TableQuery::table("clinical_cases")
                    .select("status(case_status)")
                    .eq("patient_id", patient_id)
                    .eq("is_active", true)
                    .limit(1),
                auth_token,
            )
            .await
    }

    async fn next_appointment(
        &self,
        patient_id: &str,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Option<UpcomingAppointment>> {
        self.supabase
            .select_one(
                &TableQuery::table("appointments")
                    .select(UPCOMING_COLUMNS)
                    .eq("patient_id", patient_id)
                    .gte("scheduled_at", now.to_rfc3339_opts(SecondsFormat::Millis, true))
                    .order("scheduled_at", true)
                    .limit(1),
                auth_token,
            )
            .await
    }
}
