use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Per-patient medical record ("fiche patient"), keyed by patient id rather
/// than by appointment. Carries demographics, medical free text, and the
/// single attached document; further documents hang off the documents table.
#[derive(Debug, Clone, Serialize)]
pub struct FichePatient {
    pub id: i64,
    pub patient_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub profession: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Who referred the patient to the practice.
    pub referred_by: Option<String>,
    pub sex: Option<String>,
    pub general_state: Option<String>,
    pub surgical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub dental_observations: Option<String>,
    pub document_name: Option<String>,
    pub document_path: Option<String>,
    pub document_type: Option<String>,
    pub document_size: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Partial fiche payload; absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FicheUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub profession: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub referred_by: Option<String>,
    pub sex: Option<String>,
    pub general_state: Option<String>,
    pub surgical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub dental_observations: Option<String>,
}
