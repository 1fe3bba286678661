use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, AppointmentType, CaseType};
use crate::models::{Appointment, AppointmentView, PartyBrief};

const APPOINTMENT_COLUMNS: &str = "a.id, a.patient_id, a.doctor_id, a.secretary_id, \
     a.scheduled_at, a.status, a.case_type, a.appointment_type, a.notes, \
     a.medical_history, a.allergies, a.dental_observations, a.created_at, a.updated_at";

struct AppointmentRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    secretary_id: Option<i64>,
    scheduled_at: NaiveDateTime,
    status: String,
    case_type: String,
    appointment_type: String,
    notes: Option<String>,
    medical_history: Option<String>,
    allergies: Option<String>,
    dental_observations: Option<String>,
    created_at: NaiveDateTime,
    updated_at: Option<NaiveDateTime>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        secretary_id: row.get(3)?,
        scheduled_at: row.get(4)?,
        status: row.get(5)?,
        case_type: row.get(6)?,
        appointment_type: row.get(7)?,
        notes: row.get(8)?,
        medical_history: row.get(9)?,
        allergies: row.get(10)?,
        dental_observations: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        patient_id: row.patient_id,
        doctor_id: row.doctor_id,
        secretary_id: row.secretary_id,
        scheduled_at: row.scheduled_at,
        status: AppointmentStatus::from_str(&row.status)?,
        case_type: CaseType::from_str(&row.case_type)?,
        appointment_type: AppointmentType::from_str(&row.appointment_type)?,
        notes: row.notes,
        medical_history: row.medical_history,
        allergies: row.allergies,
        dental_observations: row.dental_observations,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn insert_appointment(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
    scheduled_at: NaiveDateTime,
    case_type: CaseType,
    appointment_type: AppointmentType,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments
         (patient_id, doctor_id, scheduled_at, status, case_type, appointment_type, notes, created_at)
         VALUES (?1, ?2, ?3, 'pending', ?4, ?5, ?6, ?7)",
        params![
            patient_id,
            doctor_id,
            scheduled_at,
            case_type.as_str(),
            appointment_type.as_str(),
            notes,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1");
    let result = conn.query_row(&sql, params![id], read_row);
    match result {
        Ok(row) => Ok(Some(appointment_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A patient's appointments, newest first, with the doctor's contact card.
pub fn list_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS}, d.id, d.first_name, d.last_name, d.email, d.phone
         FROM appointments a JOIN users d ON a.doctor_id = d.id
         WHERE a.patient_id = ?1 ORDER BY a.scheduled_at DESC"
    );
    collect_views(conn, &sql, params![patient_id], Party::Doctor)
}

/// A doctor's appointments, newest first, with the patient's contact card.
pub fn list_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS}, p.id, p.first_name, p.last_name, p.email, p.phone
         FROM appointments a JOIN users p ON a.patient_id = p.id
         WHERE a.doctor_id = ?1 ORDER BY a.scheduled_at DESC"
    );
    collect_views(conn, &sql, params![doctor_id], Party::Patient)
}

enum Party {
    Patient,
    Doctor,
}

fn collect_views(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
    party: Party,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        let appointment = read_row(row)?;
        let brief = PartyBrief {
            id: row.get(14)?,
            first_name: row.get(15)?,
            last_name: row.get(16)?,
            email: row.get(17)?,
            phone: row.get(18)?,
        };
        Ok((appointment, brief))
    })?;

    let mut views = Vec::new();
    for row in rows {
        let (appointment, brief) = row?;
        let appointment = appointment_from_row(appointment)?;
        let (patient, doctor) = match party {
            Party::Patient => (Some(brief), None),
            Party::Doctor => (None, Some(brief)),
        };
        views.push(AppointmentView {
            appointment,
            patient,
            doctor,
        });
    }
    Ok(views)
}

/// Write a new status, optionally recording the secretary who set it.
pub fn set_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
    secretary_id: Option<i64>,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let rows = match secretary_id {
        Some(secretary_id) => conn.execute(
            "UPDATE appointments SET status = ?2, secretary_id = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, status.as_str(), secretary_id, now],
        )?,
        None => conn.execute(
            "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), now],
        )?,
    };
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Overwrite the embedded patient-record fields.
pub fn update_record_fields(
    conn: &Connection,
    id: i64,
    medical_history: Option<&str>,
    allergies: Option<&str>,
    dental_observations: Option<&str>,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE appointments SET medical_history = ?2, allergies = ?3,
         dental_observations = ?4, updated_at = ?5 WHERE id = ?1",
        params![id, medical_history, allergies, dental_observations, now],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{role, user};
    use chrono::{NaiveDate, Utc};

    fn seed_user(conn: &Connection, email: &str, role_name: &str) -> i64 {
        let role = role::find_role_by_name(conn, role_name).unwrap().unwrap();
        user::insert_user(
            conn,
            "Nour",
            "Gharbi",
            email,
            "hash",
            role.id,
            Utc::now().naive_utc(),
        )
        .unwrap()
    }

    fn scheduled() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn booked_appointment_starts_pending() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");

        let id = insert_appointment(
            &conn,
            patient,
            doctor,
            scheduled(),
            CaseType::Normal,
            AppointmentType::Soin,
            Some("first visit"),
            Utc::now().naive_utc(),
        )
        .unwrap();

        let appointment = get_appointment(&conn, id).unwrap().unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.patient_id, patient);
        assert_eq!(appointment.doctor_id, doctor);
        assert!(appointment.secretary_id.is_none());
        assert_eq!(appointment.scheduled_at, scheduled());
    }

    #[test]
    fn listings_carry_the_other_party() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        insert_appointment(
            &conn,
            patient,
            doctor,
            scheduled(),
            CaseType::Urgent,
            AppointmentType::Extraction,
            None,
            Utc::now().naive_utc(),
        )
        .unwrap();

        let for_patient = list_for_patient(&conn, patient).unwrap();
        assert_eq!(for_patient.len(), 1);
        assert_eq!(for_patient[0].doctor.as_ref().unwrap().id, doctor);
        assert!(for_patient[0].patient.is_none());

        let for_doctor = list_for_doctor(&conn, doctor).unwrap();
        assert_eq!(for_doctor.len(), 1);
        assert_eq!(for_doctor[0].patient.as_ref().unwrap().id, patient);
    }

    #[test]
    fn set_status_records_secretary() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let secretary = seed_user(&conn, "s@x.tn", "secretary");
        let id = insert_appointment(
            &conn,
            patient,
            doctor,
            scheduled(),
            CaseType::Normal,
            AppointmentType::Soin,
            None,
            Utc::now().naive_utc(),
        )
        .unwrap();

        set_status(
            &conn,
            id,
            AppointmentStatus::Accepted,
            Some(secretary),
            Utc::now().naive_utc(),
        )
        .unwrap();

        let appointment = get_appointment(&conn, id).unwrap().unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Accepted);
        assert_eq!(appointment.secretary_id, Some(secretary));
    }

    #[test]
    fn record_fields_are_overwritten() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let id = insert_appointment(
            &conn,
            patient,
            doctor,
            scheduled(),
            CaseType::Normal,
            AppointmentType::Soin,
            None,
            Utc::now().naive_utc(),
        )
        .unwrap();

        update_record_fields(
            &conn,
            id,
            Some("diabetic"),
            Some("penicillin"),
            None,
            Utc::now().naive_utc(),
        )
        .unwrap();

        let appointment = get_appointment(&conn, id).unwrap().unwrap();
        assert_eq!(appointment.medical_history.as_deref(), Some("diabetic"));
        assert_eq!(appointment.allergies.as_deref(), Some("penicillin"));
        assert!(appointment.dental_observations.is_none());
    }
}
