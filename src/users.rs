//! Profile management and the secretary assignment workflow.
//!
//! Secretaries point at a doctor through `assigned_doctor_id` plus a status:
//! applying sets the link with status pending, the doctor approves or
//! rejects, and removal clears the link back to none. Every decision fires
//! a notification at the other party.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::{self, AuthError};
use crate::db::repository::user;
use crate::db::DatabaseError;
use crate::models::enums::{NotificationType, RoleName, SecretaryStatus};
use crate::models::User;
use crate::notifications;
use crate::storage::{FileStore, StorageError, UploadedFile, CVS_DIR, PROFILE_PICTURES_DIR};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("Doctor not found")]
    DoctorNotFound,
    #[error("Secretary not found")]
    SecretaryNotFound,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,
    #[error("Only users with the secretary role can apply")]
    NotASecretary,
    #[error("Only doctors can manage secretaries")]
    NotADoctor,
    #[error("You are already assigned to a doctor")]
    AlreadyAssigned,
    #[error("This secretary has not applied to work with you")]
    NotYourSecretary,
    #[error("Selected user is not a doctor")]
    TargetNotADoctor,
    #[error("You are not assigned to any doctor")]
    NoAssignedDoctor,
    #[error("Action must be approved or rejected")]
    InvalidAction,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Partial profile update; absent or empty fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub fn update_profile(
    conn: &Connection,
    user_id: i64,
    request: &UpdateProfileRequest,
) -> Result<User, UserError> {
    let mut account = user::get_user(conn, user_id)?.ok_or(UserError::NotFound)?;

    if let Some(first_name) = non_empty(&request.first_name) {
        account.first_name = first_name.to_string();
    }
    if let Some(last_name) = non_empty(&request.last_name) {
        account.last_name = last_name.to_string();
    }
    if let Some(email) = non_empty(&request.email) {
        if email != account.email && user::get_user_by_email(conn, email)?.is_some() {
            return Err(UserError::EmailTaken);
        }
        account.email = email.to_string();
    }
    if let Some(phone) = non_empty(&request.phone) {
        account.phone = Some(phone.to_string());
    }
    if let Some(address) = non_empty(&request.address) {
        account.address = Some(address.to_string());
    }
    if let Some(birth_date) = request.birth_date {
        account.birth_date = Some(birth_date);
    }

    account.updated_at = Some(Utc::now().naive_utc());
    user::update_user(conn, &account)?;
    Ok(account)
}

pub fn change_password(
    conn: &Connection,
    user_id: i64,
    request: &ChangePasswordRequest,
) -> Result<(), UserError> {
    let mut account = user::get_user(conn, user_id)?.ok_or(UserError::NotFound)?;

    if !auth::verify_password(&account.password_hash, &request.current_password) {
        return Err(UserError::IncorrectCurrentPassword);
    }

    account.password_hash = auth::hash_password(&request.new_password)?;
    account.updated_at = Some(Utc::now().naive_utc());
    user::update_user(conn, &account)?;
    tracing::info!(user_id, "Password changed");
    Ok(())
}

/// Replace the profile picture; the previous file is deleted first.
pub fn update_profile_picture(
    conn: &Connection,
    storage: &FileStore,
    user_id: i64,
    file: &UploadedFile,
) -> Result<User, UserError> {
    let mut account = user::get_user(conn, user_id)?.ok_or(UserError::NotFound)?;

    if let Some(old) = &account.profile_picture_path {
        storage.delete(old);
    }
    let path = storage.store(&file.name, &file.bytes, Some(PROFILE_PICTURES_DIR))?;
    account.profile_picture_path = Some(path);
    account.updated_at = Some(Utc::now().naive_utc());
    user::update_user(conn, &account)?;
    Ok(account)
}

// ── Doctor queries ──────────────────────────────────────

pub fn list_doctors(conn: &Connection) -> Result<Vec<User>, UserError> {
    Ok(user::list_enabled_doctors(conn)?)
}

pub fn list_unassigned_doctors(conn: &Connection) -> Result<Vec<User>, UserError> {
    Ok(user::list_unassigned_doctors(conn)?)
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<User, UserError> {
    user::get_doctor(conn, id)?.ok_or(UserError::DoctorNotFound)
}

// ── Secretary assignment workflow ───────────────────────

pub fn apply_as_secretary(
    conn: &Connection,
    storage: &FileStore,
    applicant: &User,
    doctor_id: i64,
    cv: Option<&UploadedFile>,
) -> Result<User, UserError> {
    if !applicant.has_role(RoleName::Secretary) {
        return Err(UserError::NotASecretary);
    }
    if applicant.assigned_doctor_id.is_some()
        && applicant.secretary_status == SecretaryStatus::Approved
    {
        return Err(UserError::AlreadyAssigned);
    }

    let doctor = user::get_user(conn, doctor_id)?.ok_or(UserError::DoctorNotFound)?;
    if !doctor.has_role(RoleName::Doctor) {
        return Err(UserError::TargetNotADoctor);
    }

    let mut secretary = user::get_user(conn, applicant.id)?.ok_or(UserError::NotFound)?;
    if let Some(cv) = cv {
        if let Some(old) = &secretary.cv_path {
            storage.delete(old);
        }
        secretary.cv_path = Some(storage.store(&cv.name, &cv.bytes, Some(CVS_DIR))?);
    }
    secretary.assigned_doctor_id = Some(doctor.id);
    secretary.secretary_status = SecretaryStatus::Pending;
    secretary.updated_at = Some(Utc::now().naive_utc());
    user::update_user(conn, &secretary)?;

    let message = format!(
        "Secretary {} has applied to work with you",
        secretary.full_name()
    );
    notifications::notify(
        conn,
        doctor.id,
        &message,
        NotificationType::SecretaryApplication,
        Some("/doctor/secretary-applications"),
    )?;

    Ok(secretary)
}

pub fn process_secretary_application(
    conn: &Connection,
    doctor: &User,
    secretary_id: i64,
    action: SecretaryStatus,
) -> Result<User, UserError> {
    if !doctor.has_role(RoleName::Doctor) {
        return Err(UserError::NotADoctor);
    }
    if !matches!(
        action,
        SecretaryStatus::Approved | SecretaryStatus::Rejected
    ) {
        return Err(UserError::InvalidAction);
    }

    let mut secretary = user::get_user(conn, secretary_id)?.ok_or(UserError::SecretaryNotFound)?;
    if secretary.assigned_doctor_id != Some(doctor.id) {
        return Err(UserError::NotYourSecretary);
    }

    secretary.secretary_status = action;
    if action == SecretaryStatus::Rejected {
        secretary.assigned_doctor_id = None;
    }
    secretary.updated_at = Some(Utc::now().naive_utc());
    user::update_user(conn, &secretary)?;

    let status_text = if action == SecretaryStatus::Approved {
        "approved"
    } else {
        "rejected"
    };
    let message = format!(
        "Doctor {} has {status_text} your application",
        doctor.full_name()
    );
    notifications::notify(
        conn,
        secretary.id,
        &message,
        NotificationType::SecretaryApplicationResponse,
        Some("/secretary/dashboard"),
    )?;

    Ok(secretary)
}

pub fn remove_secretary(
    conn: &Connection,
    doctor: &User,
    secretary_id: i64,
) -> Result<User, UserError> {
    if !doctor.has_role(RoleName::Doctor) {
        return Err(UserError::NotADoctor);
    }

    let mut secretary = user::get_user(conn, secretary_id)?.ok_or(UserError::SecretaryNotFound)?;
    if secretary.assigned_doctor_id != Some(doctor.id) {
        return Err(UserError::NotYourSecretary);
    }

    secretary.assigned_doctor_id = None;
    secretary.secretary_status = SecretaryStatus::None;
    secretary.updated_at = Some(Utc::now().naive_utc());
    user::update_user(conn, &secretary)?;

    let message = format!(
        "Doctor {} has removed you from their team",
        doctor.full_name()
    );
    notifications::notify(
        conn,
        secretary.id,
        &message,
        NotificationType::SecretaryRemoved,
        Some("/secretary/dashboard"),
    )?;

    Ok(secretary)
}

pub fn secretary_applications(conn: &Connection, doctor: &User) -> Result<Vec<User>, UserError> {
    if !doctor.has_role(RoleName::Doctor) {
        return Err(UserError::NotADoctor);
    }
    Ok(user::list_secretaries_for_doctor(
        conn,
        doctor.id,
        SecretaryStatus::Pending,
    )?)
}

pub fn assigned_secretaries(conn: &Connection, doctor: &User) -> Result<Vec<User>, UserError> {
    if !doctor.has_role(RoleName::Doctor) {
        return Err(UserError::NotADoctor);
    }
    Ok(user::list_secretaries_for_doctor(
        conn,
        doctor.id,
        SecretaryStatus::Approved,
    )?)
}

pub fn assigned_doctor(conn: &Connection, secretary: &User) -> Result<User, UserError> {
    if !secretary.has_role(RoleName::Secretary) {
        return Err(UserError::NotASecretary);
    }
    let doctor_id = secretary
        .assigned_doctor_id
        .ok_or(UserError::NoAssignedDoctor)?;
    user::get_user(conn, doctor_id)?.ok_or(UserError::DoctorNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{notification, role};

    fn seed_user(conn: &Connection, email: &str, role_name: &str) -> User {
        let role = role::find_role_by_name(conn, role_name).unwrap().unwrap();
        let id = user::insert_user(
            conn,
            "Yas",
            "Khelifi",
            email,
            &auth::hash_password("s3cret-pass").unwrap(),
            role.id,
            Utc::now().naive_utc(),
        )
        .unwrap();
        user::get_user(conn, id).unwrap().unwrap()
    }

    fn store() -> (FileStore, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        (FileStore::new(tmp.path().join("uploads")).unwrap(), tmp)
    }

    #[test]
    fn profile_update_rejects_taken_email() {
        let conn = open_memory_database().unwrap();
        let alice = seed_user(&conn, "alice@x.tn", "patient");
        seed_user(&conn, "bob@x.tn", "patient");

        let err = update_profile(
            &conn,
            alice.id,
            &UpdateProfileRequest {
                email: Some("bob@x.tn".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));

        // Re-submitting one's own email is fine
        let updated = update_profile(
            &conn,
            alice.id,
            &UpdateProfileRequest {
                email: Some("alice@x.tn".into()),
                phone: Some("+216 20 000 000".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+216 20 000 000"));
    }

    #[test]
    fn change_password_verifies_current() {
        let conn = open_memory_database().unwrap();
        let account = seed_user(&conn, "pw@x.tn", "patient");

        let err = change_password(
            &conn,
            account.id,
            &ChangePasswordRequest {
                current_password: "wrong".into(),
                new_password: "new-password".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, UserError::IncorrectCurrentPassword));

        change_password(
            &conn,
            account.id,
            &ChangePasswordRequest {
                current_password: "s3cret-pass".into(),
                new_password: "new-password".into(),
            },
        )
        .unwrap();

        let reloaded = user::get_user(&conn, account.id).unwrap().unwrap();
        assert!(auth::verify_password(&reloaded.password_hash, "new-password"));
    }

    #[test]
    fn profile_picture_replaces_old_file() {
        let conn = open_memory_database().unwrap();
        let (storage, _tmp) = store();
        let account = seed_user(&conn, "pic@x.tn", "doctor");

        let first = update_profile_picture(
            &conn,
            &storage,
            account.id,
            &UploadedFile {
                name: "me.png".into(),
                content_type: Some("image/png".into()),
                bytes: b"one".to_vec(),
            },
        )
        .unwrap();
        let first_path = first.profile_picture_path.clone().unwrap();

        let second = update_profile_picture(
            &conn,
            &storage,
            account.id,
            &UploadedFile {
                name: "me2.png".into(),
                content_type: Some("image/png".into()),
                bytes: b"two".to_vec(),
            },
        )
        .unwrap();

        assert_ne!(second.profile_picture_path.unwrap(), first_path);
        assert!(storage.load(&first_path).is_err());
    }

    #[test]
    fn full_secretary_lifecycle() {
        let conn = open_memory_database().unwrap();
        let (storage, _tmp) = store();
        let doctor = seed_user(&conn, "doc@x.tn", "doctor");
        let secretary = seed_user(&conn, "sec@x.tn", "secretary");

        // Apply with a CV
        let cv = UploadedFile {
            name: "cv.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF-".to_vec(),
        };
        let applied =
            apply_as_secretary(&conn, &storage, &secretary, doctor.id, Some(&cv)).unwrap();
        assert_eq!(applied.secretary_status, SecretaryStatus::Pending);
        assert!(applied.cv_path.is_some());
        assert_eq!(notification::unread_count(&conn, doctor.id).unwrap(), 1);

        // Doctor sees the application
        let pending = secretary_applications(&conn, &doctor).unwrap();
        assert_eq!(pending.len(), 1);

        // Approve
        let approved = process_secretary_application(
            &conn,
            &doctor,
            secretary.id,
            SecretaryStatus::Approved,
        )
        .unwrap();
        assert_eq!(approved.secretary_status, SecretaryStatus::Approved);
        assert_eq!(notification::unread_count(&conn, secretary.id).unwrap(), 1);
        assert_eq!(assigned_secretaries(&conn, &doctor).unwrap().len(), 1);

        // Secretary resolves their doctor
        let linked = assigned_doctor(&conn, &approved).unwrap();
        assert_eq!(linked.id, doctor.id);

        // Remove
        let removed = remove_secretary(&conn, &doctor, secretary.id).unwrap();
        assert_eq!(removed.secretary_status, SecretaryStatus::None);
        assert!(removed.assigned_doctor_id.is_none());
        assert_eq!(notification::unread_count(&conn, secretary.id).unwrap(), 2);
    }

    #[test]
    fn rejection_clears_assignment() {
        let conn = open_memory_database().unwrap();
        let (storage, _tmp) = store();
        let doctor = seed_user(&conn, "doc@x.tn", "doctor");
        let secretary = seed_user(&conn, "sec@x.tn", "secretary");

        apply_as_secretary(&conn, &storage, &secretary, doctor.id, None).unwrap();
        let rejected = process_secretary_application(
            &conn,
            &doctor,
            secretary.id,
            SecretaryStatus::Rejected,
        )
        .unwrap();
        assert_eq!(rejected.secretary_status, SecretaryStatus::Rejected);
        assert!(rejected.assigned_doctor_id.is_none());
    }

    #[test]
    fn cross_doctor_processing_is_refused() {
        let conn = open_memory_database().unwrap();
        let (storage, _tmp) = store();
        let doctor = seed_user(&conn, "doc@x.tn", "doctor");
        let other = seed_user(&conn, "other@x.tn", "doctor");
        let secretary = seed_user(&conn, "sec@x.tn", "secretary");

        apply_as_secretary(&conn, &storage, &secretary, doctor.id, None).unwrap();
        let err =
            process_secretary_application(&conn, &other, secretary.id, SecretaryStatus::Approved)
                .unwrap_err();
        assert!(matches!(err, UserError::NotYourSecretary));
    }

    #[test]
    fn patients_cannot_apply_and_doctors_must_be_doctors() {
        let conn = open_memory_database().unwrap();
        let (storage, _tmp) = store();
        let patient = seed_user(&conn, "pat@x.tn", "patient");
        let doctor = seed_user(&conn, "doc@x.tn", "doctor");
        let secretary = seed_user(&conn, "sec@x.tn", "secretary");

        let err = apply_as_secretary(&conn, &storage, &patient, doctor.id, None).unwrap_err();
        assert!(matches!(err, UserError::NotASecretary));

        let err = apply_as_secretary(&conn, &storage, &secretary, patient.id, None).unwrap_err();
        assert!(matches!(err, UserError::TargetNotADoctor));
    }
}
