use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Clinic roles as stored in `profiles.id_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    Receptionist,
    Nurse,
}

impl Role {
    pub fn from_id(id_role: i32) -> Option<Self> {
        match id_role {
            1 => Some(Role::Admin),
            2 => Some(Role::Doctor),
            3 => Some(Role::Patient),
            4 => Some(Role::Receptionist),
            5 => Some(Role::Nurse),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Role::Admin => 1,
            Role::Doctor => 2,
            Role::Patient => 3,
            Role::Receptionist => 4,
            Role::Nurse => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Doctor => "Doctor",
            Role::Patient => "Patient",
            Role::Receptionist => "Receptionist",
            Role::Nurse => "Nurse",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A row of the `profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub id_role: i32,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Profile {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.id_role)
    }

    /// Admins pass every role check.
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        match self.role() {
            Some(Role::Admin) => true,
            Some(role) => allowed.contains(&role),
            None => false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whole years between `birthday` and `today`; `None` without a birthday.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birthday.and_then(|dob| today.years_since(dob))
    }
}

/// Abbreviated profile embedded in joined rows (`patient:profiles!patient_id(...)`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileRef {
    #[serde(default)]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}
