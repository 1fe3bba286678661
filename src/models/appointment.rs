use chrono::NaiveDateTime;
use serde::Serialize;

use super::enums::{AppointmentStatus, AppointmentType, CaseType};

/// A booked appointment. Links exactly one patient and one doctor, plus the
/// secretary who last managed it, if any. The medical record fields double
/// as the per-appointment patient file.
#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub secretary_id: Option<i64>,
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub case_type: CaseType,
    pub appointment_type: AppointmentType,
    pub notes: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub dental_observations: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Contact card of one appointment party, joined into listings.
#[derive(Debug, Clone, Serialize)]
pub struct PartyBrief {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Appointment plus the party the viewer cares about: listings for patients
/// carry the doctor card, listings for doctors carry the patient card.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PartyBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<PartyBrief>,
}
