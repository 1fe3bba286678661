use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::InterventionStatus;

/// A billable procedure tied to one appointment.
#[derive(Debug, Clone, Serialize)]
pub struct DentalIntervention {
    pub id: i64,
    pub appointment_id: i64,
    pub intervention_date: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub cost: Option<f64>,
    pub amount_paid: Option<f64>,
    /// Comma-separated list of affected teeth numbers.
    pub teeth_numbers: Option<String>,
    pub status: InterventionStatus,
    pub created_at: NaiveDateTime,
}

/// Payload for adding an intervention to an appointment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewIntervention {
    pub intervention_date: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub cost: Option<f64>,
    pub amount_paid: Option<f64>,
    pub teeth_numbers: Option<String>,
    #[serde(default)]
    pub status: Option<InterventionStatus>,
}
