use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::VerificationStatus;

/// One identity-verification application per doctor.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorVerification {
    pub id: i64,
    pub doctor_id: i64,
    pub status: VerificationStatus,
    pub address: String,
    pub cabinet_address: String,
    pub cabinet_name: String,
    pub postal_code: String,
    pub email: String,
    pub phone: String,
    pub years_of_experience: i64,
    pub specialties: Vec<String>,
    pub message: Option<String>,
    pub cabinet_photo_path: Option<String>,
    pub diploma_photo_path: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Submission payload for a verification application.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationRequest {
    pub address: String,
    pub cabinet_address: String,
    pub cabinet_name: String,
    pub postal_code: String,
    pub email: String,
    pub phone: String,
    pub years_of_experience: i64,
    pub specialties: Vec<String>,
    pub message: Option<String>,
}
