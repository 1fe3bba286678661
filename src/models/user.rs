use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::enums::{RoleName, SecretaryStatus};

/// An account: patient, doctor, secretary, admin, or one of the partner
/// roles. Secretaries carry an optional link to the doctor they work for.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role name from the seeded roles table.
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub enabled: bool,
    pub locked: bool,
    pub visible: bool,
    pub profile_picture_path: Option<String>,
    pub cv_path: Option<String>,
    pub certification_path: Option<String>,
    pub assigned_doctor_id: Option<i64>,
    pub secretary_status: SecretaryStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.role == role.as_str()
    }
}
