use anyhow::Result;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, TableQuery};

use crate::models::{DoctorDetail, DoctorError, DoctorSpecialty};

const DOCTOR_WITH_JOINS: &str = "*,
    profile:profiles!profile_id(id,first_name,last_name,avatar_url),
    specialty:doctor_specialties(specialty)";

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Specialties that are currently offered.
    pub async fn list_specialties(&self, auth_token: &str) -> Result<Vec<DoctorSpecialty>> {
        debug!("Fetching active specialties");

        self.supabase
            .select(
                &TableQuery::table("doctor_specialties")
                    .eq("status", "true")
                    .order("specialty", true),
                auth_token,
            )
            .await
    }

    /// Doctors of a specialty, optionally narrowed by a case-insensitive name match.
    pub async fn list_doctors(
        &self,
        specialty_id: i64,
        search: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<DoctorDetail>> {
        debug!("Fetching doctors for specialty {}", specialty_id);

        let doctors: Vec<DoctorDetail> = self
            .supabase
            .select(
                &TableQuery::table("doctor_details")
                    .select(DOCTOR_WITH_JOINS)
                    .eq("specialty_id", specialty_id),
                auth_token,
            )
            .await?;

        Ok(filter_by_name(doctors, search.unwrap_or_default()))
    }

    pub async fn get_doctor(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<DoctorDetail, DoctorError> {
        debug!("Fetching doctor {}", doctor_id);

        self.supabase
            .select_one(
                &TableQuery::table("doctor_details")
                    .select(DOCTOR_WITH_JOINS)
                    .eq("profile_id", doctor_id),
                auth_token,
            )
            .await?
            .ok_or(DoctorError::NotFound)
    }
}

/// Keeps doctors whose first or last name contains `search`, ignoring case.
/// A blank search keeps everyone.
pub fn filter_by_name(doctors: Vec<DoctorDetail>, search: &str) -> Vec<DoctorDetail> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return doctors;
    }

    doctors
        .into_iter()
        .filter(|doctor| {
            doctor.profile.as_ref().is_some_and(|p| {
                p.first_name.to_lowercase().contains(&needle)
                    || p.last_name.to_lowercase().contains(&needle)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::profile::ProfileRef;

    fn doctor(first: &str, last: &str) -> DoctorDetail {
        DoctorDetail {
            profile_id: format!("{}-{}", first, last),
            specialty_id: Some(1),
            cmp_code: None,
            available_hours: None,
            specialty: None,
            profile: Some(ProfileRef {
                id: None,
                first_name: first.to_string(),
                last_name: last.to_string(),
                avatar_url: None,
            }),
        }
    }

    #[test]
    fn name_filter_is_case_insensitive() {
        let doctors = vec![doctor("Carmen", "Salas"), doctor("Jorge", "Quispe")];
        let found = filter_by_name(doctors, "  QUIS ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].last_name(), Some("Quispe"));
    }

    #[test]
    fn blank_search_keeps_everyone() {
        let doctors = vec![doctor("Carmen", "Salas"), doctor("Jorge", "Quispe")];
        assert_eq!(filter_by_name(doctors, "").len(), 2);
    }

    #[test]
    fn doctors_without_profile_never_match_a_search() {
        let mut orphan = doctor("x", "y");
        orphan.profile = None;
        assert!(filter_by_name(vec![orphan], "x").is_empty());
    }
}
