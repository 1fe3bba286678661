use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::enums::VerificationStatus;
use crate::models::{DoctorVerification, VerificationRequest};

const VERIFICATION_COLUMNS: &str = "id, doctor_id, status, address, cabinet_address, \
     cabinet_name, postal_code, email, phone, years_of_experience, specialties, message, \
     cabinet_photo_path, diploma_photo_path, created_at, updated_at";

struct VerificationRow {
    id: i64,
    doctor_id: i64,
    status: String,
    address: String,
    cabinet_address: String,
    cabinet_name: String,
    postal_code: String,
    email: String,
    phone: String,
    years_of_experience: i64,
    specialties: String,
    message: Option<String>,
    cabinet_photo_path: Option<String>,
    diploma_photo_path: Option<String>,
    created_at: NaiveDateTime,
    updated_at: Option<NaiveDateTime>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<VerificationRow> {
    Ok(VerificationRow {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        status: row.get(2)?,
        address: row.get(3)?,
        cabinet_address: row.get(4)?,
        cabinet_name: row.get(5)?,
        postal_code: row.get(6)?,
        email: row.get(7)?,
        phone: row.get(8)?,
        years_of_experience: row.get(9)?,
        specialties: row.get(10)?,
        message: row.get(11)?,
        cabinet_photo_path: row.get(12)?,
        diploma_photo_path: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn verification_from_row(row: VerificationRow) -> Result<DoctorVerification, DatabaseError> {
    let specialties: Vec<String> = serde_json::from_str(&row.specialties).map_err(|_| {
        DatabaseError::ConstraintViolation(format!(
            "specialties column is not a JSON array: {}",
            row.specialties
        ))
    })?;
    Ok(DoctorVerification {
        id: row.id,
        doctor_id: row.doctor_id,
        status: VerificationStatus::from_str(&row.status)?,
        address: row.address,
        cabinet_address: row.cabinet_address,
        cabinet_name: row.cabinet_name,
        postal_code: row.postal_code,
        email: row.email,
        phone: row.phone,
        years_of_experience: row.years_of_experience,
        specialties,
        message: row.message,
        cabinet_photo_path: row.cabinet_photo_path,
        diploma_photo_path: row.diploma_photo_path,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn specialties_json(specialties: &[String]) -> String {
    serde_json::to_string(specialties).unwrap_or_else(|_| "[]".to_string())
}

pub fn get_by_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Option<DoctorVerification>, DatabaseError> {
    let sql = format!("SELECT {VERIFICATION_COLUMNS} FROM doctor_verifications WHERE doctor_id = ?1");
    let result = conn.query_row(&sql, params![doctor_id], read_row);
    match result {
        Ok(row) => Ok(Some(verification_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_verification(
    conn: &Connection,
    id: i64,
) -> Result<Option<DoctorVerification>, DatabaseError> {
    let sql = format!("SELECT {VERIFICATION_COLUMNS} FROM doctor_verifications WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], read_row);
    match result {
        Ok(row) => Ok(Some(verification_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_verification(
    conn: &Connection,
    doctor_id: i64,
    request: &VerificationRequest,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctor_verifications
         (doctor_id, status, address, cabinet_address, cabinet_name, postal_code, email, phone,
          years_of_experience, specialties, message, created_at)
         VALUES (?1, 'pending', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            doctor_id,
            request.address,
            request.cabinet_address,
            request.cabinet_name,
            request.postal_code,
            request.email,
            request.phone,
            request.years_of_experience,
            specialties_json(&request.specialties),
            request.message,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite application fields on re-submission; status and uploads stay.
pub fn update_fields(
    conn: &Connection,
    id: i64,
    request: &VerificationRequest,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE doctor_verifications SET address = ?2, cabinet_address = ?3, cabinet_name = ?4,
         postal_code = ?5, email = ?6, phone = ?7, years_of_experience = ?8, specialties = ?9,
         message = ?10, updated_at = ?11 WHERE id = ?1",
        params![
            id,
            request.address,
            request.cabinet_address,
            request.cabinet_name,
            request.postal_code,
            request.email,
            request.phone,
            request.years_of_experience,
            specialties_json(&request.specialties),
            request.message,
            now,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "DoctorVerification".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_status(
    conn: &Connection,
    id: i64,
    status: VerificationStatus,
    message: Option<&str>,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let rows = match message {
        Some(message) => conn.execute(
            "UPDATE doctor_verifications SET status = ?2, message = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, status.as_str(), message, now],
        )?,
        None => conn.execute(
            "UPDATE doctor_verifications SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), now],
        )?,
    };
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "DoctorVerification".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_cabinet_photo(
    conn: &Connection,
    id: i64,
    path: &str,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE doctor_verifications SET cabinet_photo_path = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, path, now],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "DoctorVerification".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_diploma_photo(
    conn: &Connection,
    id: i64,
    path: &str,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE doctor_verifications SET diploma_photo_path = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, path, now],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "DoctorVerification".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn list_by_status(
    conn: &Connection,
    status: VerificationStatus,
) -> Result<Vec<DoctorVerification>, DatabaseError> {
    let sql = format!(
        "SELECT {VERIFICATION_COLUMNS} FROM doctor_verifications
         WHERE status = ?1 ORDER BY created_at"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![status.as_str()], read_row)?;
    let mut verifications = Vec::new();
    for row in rows {
        verifications.push(verification_from_row(row?)?);
    }
    Ok(verifications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{role, user};
    use chrono::Utc;

    fn sample_request() -> VerificationRequest {
        VerificationRequest {
            address: "12 rue de la Liberté".into(),
            cabinet_address: "5 avenue Bourguiba".into(),
            cabinet_name: "Cabinet Sourire".into(),
            postal_code: "1002".into(),
            email: "cabinet@sourire.tn".into(),
            phone: "+216 71 000 000".into(),
            years_of_experience: 8,
            specialties: vec!["Orthodontie".into(), "Implantologie".into()],
            message: None,
        }
    }

    fn seed_doctor(conn: &Connection) -> i64 {
        let role = role::find_role_by_name(conn, "doctor").unwrap().unwrap();
        user::insert_user(
            conn,
            "Karim",
            "Ayadi",
            "karim@x.tn",
            "h",
            role.id,
            Utc::now().naive_utc(),
        )
        .unwrap()
    }

    #[test]
    fn insert_starts_pending_with_specialties() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn);
        let now = Utc::now().naive_utc();

        insert_verification(&conn, doctor, &sample_request(), now).unwrap();
        let verification = get_by_doctor(&conn, doctor).unwrap().unwrap();
        assert_eq!(verification.status, VerificationStatus::Pending);
        assert_eq!(
            verification.specialties,
            vec!["Orthodontie".to_string(), "Implantologie".to_string()]
        );
        assert!(verification.cabinet_photo_path.is_none());
    }

    #[test]
    fn one_application_per_doctor() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn);
        let now = Utc::now().naive_utc();
        insert_verification(&conn, doctor, &sample_request(), now).unwrap();
        let err = insert_verification(&conn, doctor, &sample_request(), now).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn status_and_uploads_update() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn);
        let now = Utc::now().naive_utc();
        let id = insert_verification(&conn, doctor, &sample_request(), now).unwrap();

        set_cabinet_photo(&conn, id, "cabinet_photos/a.jpg", now).unwrap();
        set_status(
            &conn,
            id,
            VerificationStatus::Approved,
            Some("looks good"),
            now,
        )
        .unwrap();

        let verification = get_verification(&conn, id).unwrap().unwrap();
        assert_eq!(verification.status, VerificationStatus::Approved);
        assert_eq!(verification.message.as_deref(), Some("looks good"));
        assert_eq!(
            verification.cabinet_photo_path.as_deref(),
            Some("cabinet_photos/a.jpg")
        );

        let approved = list_by_status(&conn, VerificationStatus::Approved).unwrap();
        assert_eq!(approved.len(), 1);
        assert!(list_by_status(&conn, VerificationStatus::Pending)
            .unwrap()
            .is_empty());
    }
}
