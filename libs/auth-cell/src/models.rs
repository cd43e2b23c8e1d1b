use serde::Serialize;

use doctor_cell::models::DoctorDetail;
use shared_models::profile::{Profile, Role};

/// The signed-in account as the dashboards see it.
#[derive(Debug, Clone, Serialize)]
pub struct AccountProfile {
    pub profile: Profile,
    pub role: Option<Role>,
    pub role_label: Option<&'static str>,
    /// Only set for doctors with a registered detail row.
    pub doctor: Option<DoctorDetail>,
}

impl AccountProfile {
    pub fn new(profile: Profile, doctor: Option<DoctorDetail>) -> Self {
        let role = profile.role();
        Self {
            role,
            role_label: role.map(Role::label),
            profile,
            doctor,
        }
    }
}
