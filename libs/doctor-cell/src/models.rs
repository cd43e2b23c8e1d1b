use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use shared_models::profile::ProfileRef;

// ==============================================================================
// SCHEDULES AND SLOTS
// ==============================================================================

/// One working range of a weekday, as 24h "HH:MM" strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

impl TimeRange {
    pub fn new(start_time: &str, end_time: &str) -> Self {
        Self {
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }
}

/// Weekly recurring schedule stored in `doctor_details.available_hours`:
/// weekday name (Domingo..Sabado) to its working ranges.
pub type DoctorSchedule = BTreeMap<String, Vec<TimeRange>>;

/// A bookable one-hour slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentSlot {
    /// Exact instant of the slot; this is the value a booking stores.
    pub starts_at: DateTime<Utc>,
    /// Calendar day in clinic time.
    pub date: NaiveDate,
    /// Clinic-time label, e.g. "09:00".
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySlots {
    pub doctor_id: String,
    pub week_start: NaiveDate,
    pub previous_week: NaiveDate,
    pub next_week: NaiveDate,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub slots: Vec<AppointmentSlot>,
    pub total_slots: usize,
}

/// `scheduled_at` projection of an appointment row.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedTime {
    pub scheduled_at: DateTime<Utc>,
}

// ==============================================================================
// DOCTOR DIRECTORY
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorSpecialty {
    pub id: i64,
    pub specialty: String,
    #[serde(default)]
    pub status: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialtyRef {
    pub specialty: String,
}

/// A row of `doctor_details`, optionally with its profile and specialty embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorDetail {
    pub profile_id: String,
    #[serde(default)]
    pub specialty_id: Option<i64>,
    #[serde(default)]
    pub cmp_code: Option<String>,
    #[serde(default)]
    pub available_hours: Option<DoctorSchedule>,
    #[serde(default)]
    pub specialty: Option<SpecialtyRef>,
    #[serde(default)]
    pub profile: Option<ProfileRef>,
}

impl DoctorDetail {
    pub fn schedule(&self) -> DoctorSchedule {
        self.available_hours.clone().unwrap_or_default()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.last_name.as_str())
    }

    pub fn display_name(&self) -> String {
        match &self.profile {
            Some(p) => format!("Dr. {} {}", p.first_name, p.last_name),
            None => "Dr.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorListQuery {
    pub specialty_id: i64,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotsQuery {
    pub week_start: Option<NaiveDate>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::Store(e) => AppError::database("Could not load doctor data", e),
        }
    }
}
