//! Doctor identity verification workflow.
//!
//! One application per doctor. Re-submitting while pending or rejected
//! overwrites the application fields; an approved application is final.
//! The status transition itself is admin-only and unconditional.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::verification;
use crate::db::DatabaseError;
use crate::models::enums::{RoleName, VerificationStatus};
use crate::models::{DoctorVerification, User, VerificationRequest};
use crate::storage::{
    FileStore, StorageError, UploadedFile, CABINET_PHOTOS_DIR, DIPLOMA_DOCS_DIR,
};

/// The specialty catalogue applications are validated against.
pub const SPECIALTIES: &[&str] = &[
    "Dentisterie générale",
    "Orthodontie",
    "Chirurgie buccale et maxillo-faciale",
    "Parodontie",
    "Endodontie",
    "Prothèse dentaire",
    "Dentisterie pédiatrique",
    "Dentisterie esthétique",
    "Implantologie",
    "Radiologie buccale",
    "Médecine buccale",
    "Dentisterie gériatrique",
    "Dentisterie préventive",
];

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Verification not found")]
    NotFound,
    #[error("Only doctors can submit verification requests")]
    NotADoctor,
    #[error("Your verification is already approved")]
    AlreadyApproved,
    #[error("Unknown specialty: {0}")]
    UnknownSpecialty(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub fn is_valid_specialty(specialty: &str) -> bool {
    SPECIALTIES.contains(&specialty)
}

/// Submit or re-submit a verification application for `doctor`.
pub fn submit(
    conn: &Connection,
    doctor: &User,
    request: &VerificationRequest,
) -> Result<DoctorVerification, VerificationError> {
    if !doctor.has_role(RoleName::Doctor) {
        return Err(VerificationError::NotADoctor);
    }
    if let Some(unknown) = request
        .specialties
        .iter()
        .find(|s| !is_valid_specialty(s))
    {
        return Err(VerificationError::UnknownSpecialty(unknown.clone()));
    }

    let now = Utc::now().naive_utc();
    match verification::get_by_doctor(conn, doctor.id)? {
        Some(existing) => {
            if existing.status == VerificationStatus::Approved {
                return Err(VerificationError::AlreadyApproved);
            }
            verification::update_fields(conn, existing.id, request, now)?;
            verification::get_verification(conn, existing.id)?.ok_or(VerificationError::NotFound)
        }
        None => {
            let id = verification::insert_verification(conn, doctor.id, request, now)?;
            tracing::info!(doctor_id = doctor.id, "Verification application submitted");
            verification::get_verification(conn, id)?.ok_or(VerificationError::NotFound)
        }
    }
}

pub fn get_by_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<DoctorVerification, VerificationError> {
    verification::get_by_doctor(conn, doctor_id)?.ok_or(VerificationError::NotFound)
}

pub fn pending(conn: &Connection) -> Result<Vec<DoctorVerification>, VerificationError> {
    Ok(verification::list_by_status(
        conn,
        VerificationStatus::Pending,
    )?)
}

pub fn approved(conn: &Connection) -> Result<Vec<DoctorVerification>, VerificationError> {
    Ok(verification::list_by_status(
        conn,
        VerificationStatus::Approved,
    )?)
}

/// Admin-only status transition; unconditional. Approval does not touch the
/// doctor's user row.
pub fn set_status(
    conn: &Connection,
    verification_id: i64,
    status: VerificationStatus,
    message: Option<&str>,
) -> Result<DoctorVerification, VerificationError> {
    let existing = verification::get_verification(conn, verification_id)?
        .ok_or(VerificationError::NotFound)?;

    let now = Utc::now().naive_utc();
    verification::set_status(
        conn,
        existing.id,
        status,
        message.filter(|m| !m.is_empty()),
        now,
    )?;
    tracing::info!(
        verification_id,
        doctor_id = existing.doctor_id,
        status = status.as_str(),
        "Verification status updated"
    );
    verification::get_verification(conn, verification_id)?.ok_or(VerificationError::NotFound)
}

/// Replace the cabinet photo; the previous upload is deleted.
pub fn upload_cabinet_photo(
    conn: &Connection,
    storage: &FileStore,
    verification_id: i64,
    file: &UploadedFile,
) -> Result<DoctorVerification, VerificationError> {
    let existing = verification::get_verification(conn, verification_id)?
        .ok_or(VerificationError::NotFound)?;

    if let Some(old) = &existing.cabinet_photo_path {
        storage.delete(old);
    }
    let path = storage.store(&file.name, &file.bytes, Some(CABINET_PHOTOS_DIR))?;
    verification::set_cabinet_photo(conn, existing.id, &path, Utc::now().naive_utc())?;
    verification::get_verification(conn, verification_id)?.ok_or(VerificationError::NotFound)
}

/// Replace the diploma document (image or PDF) the same way.
pub fn upload_diploma(
    conn: &Connection,
    storage: &FileStore,
    verification_id: i64,
    file: &UploadedFile,
) -> Result<DoctorVerification, VerificationError> {
    let existing = verification::get_verification(conn, verification_id)?
        .ok_or(VerificationError::NotFound)?;

    if let Some(old) = &existing.diploma_photo_path {
        storage.delete(old);
    }
    let path = storage.store(&file.name, &file.bytes, Some(DIPLOMA_DOCS_DIR))?;
    verification::set_diploma_photo(conn, existing.id, &path, Utc::now().naive_utc())?;
    verification::get_verification(conn, verification_id)?.ok_or(VerificationError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{role, user};

    fn seed_user(conn: &Connection, email: &str, role_name: &str) -> User {
        let role = role::find_role_by_name(conn, role_name).unwrap().unwrap();
        let id = user::insert_user(
            conn,
            "Sana",
            "Mejri",
            email,
            "h",
            role.id,
            Utc::now().naive_utc(),
        )
        .unwrap();
        user::get_user(conn, id).unwrap().unwrap()
    }

    fn request() -> VerificationRequest {
        VerificationRequest {
            address: "2 rue Ibn Khaldoun".into(),
            cabinet_address: "14 avenue de Carthage".into(),
            cabinet_name: "Cabinet Mejri".into(),
            postal_code: "4000".into(),
            email: "cabinet@mejri.tn".into(),
            phone: "+216 73 000 000".into(),
            years_of_experience: 12,
            specialties: vec!["Parodontie".into()],
            message: Some("cabinet photos to follow".into()),
        }
    }

    fn store() -> (FileStore, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        (FileStore::new(tmp.path().join("uploads")).unwrap(), tmp)
    }

    #[test]
    fn only_doctors_submit_and_specialties_are_checked() {
        let conn = open_memory_database().unwrap();
        let patient = seed_user(&conn, "p@x.tn", "patient");
        let doctor = seed_user(&conn, "d@x.tn", "doctor");

        assert!(matches!(
            submit(&conn, &patient, &request()).unwrap_err(),
            VerificationError::NotADoctor
        ));

        let mut bad = request();
        bad.specialties.push("Astrologie".into());
        assert!(matches!(
            submit(&conn, &doctor, &bad).unwrap_err(),
            VerificationError::UnknownSpecialty(_)
        ));

        let submitted = submit(&conn, &doctor, &request()).unwrap();
        assert_eq!(submitted.status, VerificationStatus::Pending);
    }

    #[test]
    fn resubmission_overwrites_until_approved() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_user(&conn, "d@x.tn", "doctor");

        let first = submit(&conn, &doctor, &request()).unwrap();

        let mut revised = request();
        revised.years_of_experience = 13;
        let second = submit(&conn, &doctor, &revised).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.years_of_experience, 13);

        set_status(&conn, first.id, VerificationStatus::Approved, None).unwrap();
        assert!(matches!(
            submit(&conn, &doctor, &request()).unwrap_err(),
            VerificationError::AlreadyApproved
        ));
    }

    #[test]
    fn rejected_applications_can_be_resubmitted() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_user(&conn, "d@x.tn", "doctor");

        let first = submit(&conn, &doctor, &request()).unwrap();
        set_status(
            &conn,
            first.id,
            VerificationStatus::Rejected,
            Some("diploma unreadable"),
        )
        .unwrap();

        let resubmitted = submit(&conn, &doctor, &request()).unwrap();
        // Fields overwritten, status stays rejected until the admin re-reviews
        assert_eq!(resubmitted.status, VerificationStatus::Rejected);
        assert_eq!(resubmitted.message.as_deref(), Some("cabinet photos to follow"));
    }

    #[test]
    fn listings_follow_status() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let submitted = submit(&conn, &doctor, &request()).unwrap();

        assert_eq!(pending(&conn).unwrap().len(), 1);
        assert!(approved(&conn).unwrap().is_empty());

        set_status(&conn, submitted.id, VerificationStatus::Approved, None).unwrap();
        assert!(pending(&conn).unwrap().is_empty());
        assert_eq!(approved(&conn).unwrap().len(), 1);
    }

    #[test]
    fn uploads_replace_previous_files() {
        let conn = open_memory_database().unwrap();
        let (storage, _tmp) = store();
        let doctor = seed_user(&conn, "d@x.tn", "doctor");
        let submitted = submit(&conn, &doctor, &request()).unwrap();

        let photo = UploadedFile {
            name: "cabinet.jpg".into(),
            content_type: Some("image/jpeg".into()),
            bytes: b"jpeg-1".to_vec(),
        };
        let first = upload_cabinet_photo(&conn, &storage, submitted.id, &photo).unwrap();
        let first_path = first.cabinet_photo_path.unwrap();
        assert!(first_path.starts_with("cabinet_photos/"));

        let second = upload_cabinet_photo(&conn, &storage, submitted.id, &photo).unwrap();
        assert_ne!(second.cabinet_photo_path.as_deref(), Some(first_path.as_str()));
        assert!(storage.load(&first_path).is_err());

        let diploma = UploadedFile {
            name: "diploma.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF-".to_vec(),
        };
        let with_diploma = upload_diploma(&conn, &storage, submitted.id, &diploma).unwrap();
        assert!(with_diploma
            .diploma_photo_path
            .unwrap()
            .starts_with("diploma_docs/"));
    }
}
