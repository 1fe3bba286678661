//! Appointment booking, the status workflow, and the per-appointment
//! patient record.
//!
//! Authorization inside this module is deliberately flat: a user may touch
//! an appointment iff they are its patient, its doctor, or the secretary
//! recorded on it. Secretaries additionally act on a doctor's behalf only
//! while their assignment is approved. Status changes follow
//! pending → accepted/rejected → completed; writes outside that graph are
//! refused.

use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::repository::{appointment, document, intervention, user};
use crate::db::DatabaseError;
use crate::models::enums::{
    AppointmentStatus, AppointmentType, CaseType, InterventionStatus, NotificationType,
    SecretaryStatus,
};
use crate::models::{
    Appointment, AppointmentView, DentalIntervention, NewIntervention, StoredDocument, User,
};
use crate::notifications;
use crate::storage::{FileStore, StorageError, UploadedFile, DOCUMENTS_DIR};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Patient not found")]
    PatientNotFound,
    #[error("Doctor not found")]
    DoctorNotFound,
    #[error("Appointment not found")]
    NotFound,
    #[error("Secretary not found")]
    SecretaryNotFound,
    #[error("Secretary is not assigned to any doctor or not approved")]
    SecretaryUnassigned,
    #[error("Secretary is not authorized to manage this appointment")]
    SecretaryNotAuthorized,
    #[error("Not authorized to access this patient file")]
    NotAuthorized,
    #[error("Only the appointment's doctor can add interventions")]
    NotTheDoctor,
    #[error("Cannot change appointment status from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("Invalid patient record payload: {0}")]
    InvalidRecordPayload(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// The intended workflow: a pending booking is accepted or rejected, an
/// accepted one is completed (or withdrawn), a rejected one can be
/// reconsidered. Completed is terminal.
pub fn transition_allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    matches!(
        (from, to),
        (Pending, Accepted)
            | (Pending, Rejected)
            | (Accepted, Completed)
            | (Accepted, Rejected)
            | (Rejected, Accepted)
    )
}

fn check_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), AppointmentError> {
    if transition_allowed(from, to) {
        Ok(())
    } else {
        Err(AppointmentError::InvalidTransition { from, to })
    }
}

/// True iff `user` is the patient, the doctor, or the recorded secretary.
pub fn is_authorized_for_appointment(user: &User, appointment: &Appointment) -> bool {
    user.id == appointment.patient_id
        || user.id == appointment.doctor_id
        || appointment.secretary_id == Some(user.id)
}

// ── Booking & listings ──────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub doctor_id: i64,
    pub scheduled_at: NaiveDateTime,
    pub case_type: CaseType,
    pub appointment_type: AppointmentType,
    pub notes: Option<String>,
}

/// Book an appointment for `patient_id`. No availability check is made;
/// overlapping bookings are accepted and left to the secretary to sort out.
pub fn book(
    conn: &Connection,
    patient_id: i64,
    request: &BookingRequest,
) -> Result<Appointment, AppointmentError> {
    let patient = user::get_user(conn, patient_id)?.ok_or(AppointmentError::PatientNotFound)?;
    let doctor =
        user::get_user(conn, request.doctor_id)?.ok_or(AppointmentError::DoctorNotFound)?;

    let now = Utc::now().naive_utc();
    let id = appointment::insert_appointment(
        conn,
        patient.id,
        doctor.id,
        request.scheduled_at,
        request.case_type,
        request.appointment_type,
        request.notes.as_deref(),
        now,
    )?;
    let booked = appointment::get_appointment(conn, id)?.ok_or(AppointmentError::NotFound)?;

    let message = format!(
        "New appointment with patient {} on {}",
        patient.full_name(),
        request.scheduled_at.format(DATE_FORMAT)
    );
    notifications::notify(
        conn,
        doctor.id,
        &message,
        NotificationType::NewAppointment,
        Some(&format!("/doctor/appointments/{id}")),
    )?;

    tracing::info!(appointment_id = id, patient_id, doctor_id = doctor.id, "Appointment booked");
    Ok(booked)
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<AppointmentView>, AppointmentError> {
    user::get_user(conn, patient_id)?.ok_or(AppointmentError::PatientNotFound)?;
    Ok(appointment::list_for_patient(conn, patient_id)?)
}

pub fn list_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<AppointmentView>, AppointmentError> {
    Ok(appointment::list_for_doctor(conn, doctor_id)?)
}

/// A secretary sees the appointment book of their assigned doctor, and only
/// while the assignment is approved.
pub fn list_for_secretary(
    conn: &Connection,
    secretary_id: i64,
) -> Result<Vec<AppointmentView>, AppointmentError> {
    let secretary =
        user::get_user(conn, secretary_id)?.ok_or(AppointmentError::SecretaryNotFound)?;
    let doctor_id = match secretary.assigned_doctor_id {
        Some(doctor_id) if secretary.secretary_status == SecretaryStatus::Approved => doctor_id,
        _ => return Err(AppointmentError::SecretaryUnassigned),
    };
    Ok(appointment::list_for_doctor(conn, doctor_id)?)
}

// ── Status workflow ─────────────────────────────────────

/// Secretary path: requires the acting secretary to be the appointment
/// doctor's currently assigned and approved secretary. Records the
/// secretary on the appointment and notifies both doctor and patient.
pub fn update_status_by_secretary(
    conn: &Connection,
    appointment_id: i64,
    status: AppointmentStatus,
    secretary_id: i64,
) -> Result<Appointment, AppointmentError> {
    let current =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
    let secretary =
        user::get_user(conn, secretary_id)?.ok_or(AppointmentError::SecretaryNotFound)?;

    if secretary.assigned_doctor_id != Some(current.doctor_id)
        || secretary.secretary_status != SecretaryStatus::Approved
    {
        return Err(AppointmentError::SecretaryNotAuthorized);
    }
    check_transition(current.status, status)?;

    let now = Utc::now().naive_utc();
    appointment::set_status(conn, appointment_id, status, Some(secretary.id), now)?;
    let updated =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;

    let doctor_message = format!(
        "Appointment status updated to {} by secretary {}",
        status.as_str(),
        secretary.full_name()
    );
    notifications::notify(
        conn,
        updated.doctor_id,
        &doctor_message,
        NotificationType::AppointmentUpdated,
        Some(&format!("/doctor/appointments/{appointment_id}")),
    )?;

    let patient_message = format!(
        "Your appointment status has been updated to {}",
        status.as_str()
    );
    notifications::notify(
        conn,
        updated.patient_id,
        &patient_message,
        NotificationType::AppointmentUpdated,
        Some(&format!("/patient/appointments/{appointment_id}")),
    )?;

    Ok(updated)
}

/// Doctor path. Ownership is the caller's responsibility (the handler
/// verifies the authenticated doctor owns the appointment before calling).
pub fn update_status_by_doctor(
    conn: &Connection,
    appointment_id: i64,
    status: AppointmentStatus,
) -> Result<Appointment, AppointmentError> {
    let current =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
    check_transition(current.status, status)?;

    let now = Utc::now().naive_utc();
    appointment::set_status(conn, appointment_id, status, None, now)?;
    let updated =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;

    let doctor = user::get_user(conn, updated.doctor_id)?.ok_or(AppointmentError::DoctorNotFound)?;
    let message = format!(
        "Your appointment status has been updated to {} by Dr. {}",
        status.as_str(),
        doctor.last_name
    );
    notifications::notify(
        conn,
        updated.patient_id,
        &message,
        NotificationType::AppointmentUpdated,
        Some(&format!("/patient/appointments/{appointment_id}")),
    )?;

    Ok(updated)
}

pub fn find(conn: &Connection, appointment_id: i64) -> Result<Option<Appointment>, AppointmentError> {
    Ok(appointment::get_appointment(conn, appointment_id)?)
}

// ── Per-appointment patient record ──────────────────────

/// Partial record payload; unknown keys are ignored, absent keys keep the
/// stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPayload {
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub dental_observations: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PatientRecord {
    pub appointment: Appointment,
    pub interventions: Vec<DentalIntervention>,
    pub documents: Vec<StoredDocument>,
}

/// Merge a partial record payload into the appointment and attach any
/// uploaded files. Every save notifies doctor, patient, and the secretary
/// when one is recorded.
pub fn save_patient_record(
    conn: &Connection,
    storage: &FileStore,
    current_user: &User,
    appointment_id: i64,
    payload_json: &str,
    files: &[UploadedFile],
) -> Result<PatientRecord, AppointmentError> {
    let current =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
    if !is_authorized_for_appointment(current_user, &current) {
        return Err(AppointmentError::NotAuthorized);
    }

    let payload: RecordPayload = serde_json::from_str(payload_json)
        .map_err(|e| AppointmentError::InvalidRecordPayload(e.to_string()))?;

    let medical_history = payload.medical_history.or(current.medical_history);
    let allergies = payload.allergies.or(current.allergies);
    let dental_observations = payload.dental_observations.or(current.dental_observations);

    let now = Utc::now().naive_utc();
    appointment::update_record_fields(
        conn,
        appointment_id,
        medical_history.as_deref(),
        allergies.as_deref(),
        dental_observations.as_deref(),
        now,
    )?;

    for file in files {
        let path = storage.store(&file.name, &file.bytes, Some(DOCUMENTS_DIR))?;
        document::insert_appointment_document(
            conn,
            appointment_id,
            &file.name,
            &path,
            file.content_type.as_deref(),
            file.bytes.len() as i64,
            now,
        )?;
    }

    let updated =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
    notify_record_update(conn, &updated)?;

    Ok(PatientRecord {
        interventions: intervention::list_for_appointment(conn, appointment_id)?,
        documents: document::list_for_appointment(conn, appointment_id)?,
        appointment: updated,
    })
}

pub fn get_patient_record(
    conn: &Connection,
    current_user: &User,
    appointment_id: i64,
) -> Result<PatientRecord, AppointmentError> {
    let current =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
    if !is_authorized_for_appointment(current_user, &current) {
        return Err(AppointmentError::NotAuthorized);
    }

    Ok(PatientRecord {
        interventions: intervention::list_for_appointment(conn, appointment_id)?,
        documents: document::list_for_appointment(conn, appointment_id)?,
        appointment: current,
    })
}

fn notify_record_update(conn: &Connection, updated: &Appointment) -> Result<(), AppointmentError> {
    let message = format!(
        "Patient file has been updated for appointment on {}",
        updated.scheduled_at.format(DATE_FORMAT)
    );

    notifications::notify(
        conn,
        updated.doctor_id,
        &message,
        NotificationType::AppointmentUpdated,
        Some(&format!("/doctor/appointments/{}", updated.id)),
    )?;
    notifications::notify(
        conn,
        updated.patient_id,
        &message,
        NotificationType::AppointmentUpdated,
        Some(&format!("/patient/appointments/{}", updated.id)),
    )?;
    if let Some(secretary_id) = updated.secretary_id {
        notifications::notify(
            conn,
            secretary_id,
            &message,
            NotificationType::AppointmentUpdated,
            Some(&format!("/secretary/appointments/{}", updated.id)),
        )?;
    }
    Ok(())
}

// ── Interventions ───────────────────────────────────────

pub fn list_interventions(
    conn: &Connection,
    current_user: &User,
    appointment_id: i64,
) -> Result<Vec<DentalIntervention>, AppointmentError> {
    let current =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
    if !is_authorized_for_appointment(current_user, &current) {
        return Err(AppointmentError::NotAuthorized);
    }
    Ok(intervention::list_for_appointment(conn, appointment_id)?)
}

/// Only the appointment's own doctor may add interventions.
pub fn add_intervention(
    conn: &Connection,
    doctor: &User,
    appointment_id: i64,
    payload: &NewIntervention,
) -> Result<DentalIntervention, AppointmentError> {
    let current =
        appointment::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
    if current.doctor_id != doctor.id {
        return Err(AppointmentError::NotTheDoctor);
    }

    let now = Utc::now().naive_utc();
    let id = intervention::insert_intervention(
        conn,
        appointment_id,
        payload.intervention_date,
        payload.description.as_deref(),
        payload.cost,
        payload.amount_paid,
        payload.teeth_numbers.as_deref(),
        payload.status.unwrap_or(InterventionStatus::Planned),
        now,
    )?;

    let message = format!(
        "New dental intervention added to your appointment on {}",
        current.scheduled_at.format(DATE_FORMAT)
    );
    notifications::notify(
        conn,
        current.patient_id,
        &message,
        NotificationType::AppointmentUpdated,
        Some(&format!("/patient/appointments/{appointment_id}")),
    )?;

    intervention::get_intervention(conn, id)?.ok_or(AppointmentError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{notification, role};
    use chrono::NaiveDate;

    fn seed_user(conn: &Connection, email: &str, role_name: &str) -> User {
        let role = role::find_role_by_name(conn, role_name).unwrap().unwrap();
        let id = user::insert_user(
            conn,
            "Rim",
            "Jlassi",
            email,
            "hash",
            role.id,
            Utc::now().naive_utc(),
        )
        .unwrap();
        user::get_user(conn, id).unwrap().unwrap()
    }

    fn approve_secretary(conn: &Connection, secretary: &User, doctor_id: i64) -> User {
        let mut updated = secretary.clone();
        updated.assigned_doctor_id = Some(doctor_id);
        updated.secretary_status = SecretaryStatus::Approved;
        user::update_user(conn, &updated).unwrap();
        updated
    }

    fn booking(doctor_id: i64) -> BookingRequest {
        BookingRequest {
            doctor_id,
            scheduled_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            case_type: CaseType::Normal,
            appointment_type: AppointmentType::Soin,
            notes: None,
        }
    }

    fn store() -> (FileStore, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        (FileStore::new(tmp.path().join("uploads")).unwrap(), tmp)
    }

    #[test]
    fn booking_creates_pending_and_notifies_doctor() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");

        let booked = book(&conn, patient.id, &booking(doctor.id)).unwrap();
        assert_eq!(booked.status, AppointmentStatus::Pending);

        let inbox = notification::list_for_user(&conn, doctor.id).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].notification_type, NotificationType::NewAppointment);
        assert_eq!(
            inbox[0].link.as_deref(),
            Some(format!("/doctor/appointments/{}", booked.id).as_str())
        );
    }

    #[test]
    fn booking_unknown_doctor_creates_nothing() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");

        let err = book(&conn, patient.id, &booking(999)).unwrap_err();
        assert!(matches!(err, AppointmentError::DoctorNotFound));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn authorization_is_exactly_three_way() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let secretary = seed_user(&conn, "s@x.tn", "secretary");
        let stranger = seed_user(&conn, "z@x.tn", "patient");
        let secretary = approve_secretary(&conn, &secretary, doctor.id);

        let booked = book(&conn, patient.id, &booking(doctor.id)).unwrap();

        assert!(is_authorized_for_appointment(&patient, &booked));
        assert!(is_authorized_for_appointment(&doctor, &booked));
        // Secretary is not authorized until recorded on the appointment
        assert!(!is_authorized_for_appointment(&secretary, &booked));
        assert!(!is_authorized_for_appointment(&stranger, &booked));

        let updated = update_status_by_secretary(
            &conn,
            booked.id,
            AppointmentStatus::Accepted,
            secretary.id,
        )
        .unwrap();
        assert!(is_authorized_for_appointment(&secretary, &updated));
        assert!(!is_authorized_for_appointment(&stranger, &updated));
    }

    #[test]
    fn secretary_update_notifies_both_parties() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let secretary = seed_user(&conn, "s@x.tn", "secretary");
        let secretary = approve_secretary(&conn, &secretary, doctor.id);

        let booked = book(&conn, patient.id, &booking(doctor.id)).unwrap();
        let updated = update_status_by_secretary(
            &conn,
            booked.id,
            AppointmentStatus::Accepted,
            secretary.id,
        )
        .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Accepted);
        assert_eq!(updated.secretary_id, Some(secretary.id));

        // booking notification + update notification
        assert_eq!(notification::list_for_user(&conn, doctor.id).unwrap().len(), 2);
        let patient_inbox = notification::list_for_user(&conn, patient.id).unwrap();
        assert_eq!(patient_inbox.len(), 1);
        assert_eq!(
            patient_inbox[0].notification_type,
            NotificationType::AppointmentUpdated
        );
    }

    #[test]
    fn unassigned_secretary_is_refused() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let other_doctor = seed_user(&conn, "d2@x.tn", "doctor");
        let unassigned = seed_user(&conn, "s1@x.tn", "secretary");
        let elsewhere = seed_user(&conn, "s2@x.tn", "secretary");
        let elsewhere = approve_secretary(&conn, &elsewhere, other_doctor.id);

        let booked = book(&conn, patient.id, &booking(doctor.id)).unwrap();

        let err = update_status_by_secretary(
            &conn,
            booked.id,
            AppointmentStatus::Accepted,
            unassigned.id,
        )
        .unwrap_err();
        assert!(matches!(err, AppointmentError::SecretaryNotAuthorized));

        // Approved, but for another doctor
        let err = update_status_by_secretary(
            &conn,
            booked.id,
            AppointmentStatus::Accepted,
            elsewhere.id,
        )
        .unwrap_err();
        assert!(matches!(err, AppointmentError::SecretaryNotAuthorized));
    }

    #[test]
    fn transition_graph_is_enforced() {
        use AppointmentStatus::*;
        assert!(transition_allowed(Pending, Accepted));
        assert!(transition_allowed(Pending, Rejected));
        assert!(transition_allowed(Accepted, Completed));
        assert!(transition_allowed(Accepted, Rejected));
        assert!(transition_allowed(Rejected, Accepted));

        assert!(!transition_allowed(Pending, Completed));
        assert!(!transition_allowed(Completed, Pending));
        assert!(!transition_allowed(Completed, Accepted));
        assert!(!transition_allowed(Accepted, Accepted));

        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let booked = book(&conn, patient.id, &booking(doctor.id)).unwrap();

        let err =
            update_status_by_doctor(&conn, booked.id, AppointmentStatus::Completed).unwrap_err();
        assert!(matches!(err, AppointmentError::InvalidTransition { .. }));

        update_status_by_doctor(&conn, booked.id, AppointmentStatus::Accepted).unwrap();
        let done = update_status_by_doctor(&conn, booked.id, AppointmentStatus::Completed).unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);
    }

    #[test]
    fn record_save_merges_and_notifies() {
        let conn = open_memory_database().unwrap();
        let (storage, _tmp) = store();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let booked = book(&conn, patient.id, &booking(doctor.id)).unwrap();

        let record = save_patient_record(
            &conn,
            &storage,
            &doctor,
            booked.id,
            r#"{"medical_history": "asthma", "allergies": "none"}"#,
            &[UploadedFile {
                name: "xray.png".into(),
                content_type: Some("image/png".into()),
                bytes: b"png".to_vec(),
            }],
        )
        .unwrap();
        assert_eq!(record.appointment.medical_history.as_deref(), Some("asthma"));
        assert_eq!(record.documents.len(), 1);

        // A second partial save keeps the untouched fields
        let record = save_patient_record(
            &conn,
            &storage,
            &doctor,
            booked.id,
            r#"{"dental_observations": "caries on 36"}"#,
            &[],
        )
        .unwrap();
        assert_eq!(record.appointment.medical_history.as_deref(), Some("asthma"));
        assert_eq!(
            record.appointment.dental_observations.as_deref(),
            Some("caries on 36")
        );

        // booking + 2 record updates for the doctor; 2 record updates for the patient
        assert_eq!(notification::list_for_user(&conn, doctor.id).unwrap().len(), 3);
        assert_eq!(notification::list_for_user(&conn, patient.id).unwrap().len(), 2);
    }

    #[test]
    fn record_access_is_gated() {
        let conn = open_memory_database().unwrap();
        let (storage, _tmp) = store();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let stranger = seed_user(&conn, "z@x.tn", "doctor");
        let booked = book(&conn, patient.id, &booking(doctor.id)).unwrap();

        let err = get_patient_record(&conn, &stranger, booked.id).unwrap_err();
        assert!(matches!(err, AppointmentError::NotAuthorized));

        let err =
            save_patient_record(&conn, &storage, &stranger, booked.id, "{}", &[]).unwrap_err();
        assert!(matches!(err, AppointmentError::NotAuthorized));
    }

    #[test]
    fn interventions_require_the_owning_doctor() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let other = seed_user(&conn, "o@x.tn", "doctor");
        let booked = book(&conn, patient.id, &booking(doctor.id)).unwrap();

        let payload = NewIntervention {
            intervention_date: None,
            description: Some("extraction of 48".into()),
            cost: Some(200.0),
            amount_paid: None,
            teeth_numbers: Some("48".into()),
            status: None,
        };

        let err = add_intervention(&conn, &other, booked.id, &payload).unwrap_err();
        assert!(matches!(err, AppointmentError::NotTheDoctor));

        let added = add_intervention(&conn, &doctor, booked.id, &payload).unwrap();
        assert_eq!(added.status, InterventionStatus::Planned);

        let listed = list_interventions(&conn, &patient, booked.id).unwrap();
        assert_eq!(listed.len(), 1);

        // The patient got an intervention notification on top of nothing else
        let patient_inbox = notification::list_for_user(&conn, patient.id).unwrap();
        assert_eq!(patient_inbox.len(), 1);
    }
}
