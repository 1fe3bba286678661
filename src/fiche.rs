//! Per-patient medical record ("fiche patient") workflow.
//!
//! One fiche per patient id, created on first write. The single attached
//! document lives in the fiche columns and is mirrored as a `patient`-kind
//! row in the documents table; replacing it deletes the previous file and
//! clears the mirrored rows.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::{document, fiche};
use crate::db::DatabaseError;
use crate::models::{FichePatient, FicheUpdate, User};
use crate::storage::{FileStore, StorageError, UploadedFile, DOCUMENTS_DIR};

#[derive(Debug, Error)]
pub enum FicheError {
    #[error("No fiche found for this patient")]
    NotFound,
    #[error("No document attached to this fiche")]
    NoDocument,
    #[error("Please select a file to upload")]
    EmptyFile,
    #[error("Only images and PDF documents are accepted")]
    UnsupportedDocumentType,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub fn get_fiche(conn: &Connection, patient_id: i64) -> Result<FichePatient, FicheError> {
    fiche::get_by_patient(conn, patient_id)?.ok_or(FicheError::NotFound)
}

fn merge(existing: &mut FichePatient, fields: &FicheUpdate) {
    let FicheUpdate {
        first_name,
        last_name,
        birth_date,
        profession,
        phone,
        address,
        referred_by,
        sex,
        general_state,
        surgical_history,
        current_medications,
        allergies,
        dental_observations,
    } = fields;

    if first_name.is_some() {
        existing.first_name = first_name.clone();
    }
    if last_name.is_some() {
        existing.last_name = last_name.clone();
    }
    if birth_date.is_some() {
        existing.birth_date = *birth_date;
    }
    if profession.is_some() {
        existing.profession = profession.clone();
    }
    if phone.is_some() {
        existing.phone = phone.clone();
    }
    if address.is_some() {
        existing.address = address.clone();
    }
    if referred_by.is_some() {
        existing.referred_by = referred_by.clone();
    }
    if sex.is_some() {
        existing.sex = sex.clone();
    }
    if general_state.is_some() {
        existing.general_state = general_state.clone();
    }
    if surgical_history.is_some() {
        existing.surgical_history = surgical_history.clone();
    }
    if current_medications.is_some() {
        existing.current_medications = current_medications.clone();
    }
    if allergies.is_some() {
        existing.allergies = allergies.clone();
    }
    if dental_observations.is_some() {
        existing.dental_observations = dental_observations.clone();
    }
}

/// Create the fiche on first write, merge into it afterwards.
pub fn upsert_fiche(
    conn: &Connection,
    patient_id: i64,
    fields: &FicheUpdate,
) -> Result<FichePatient, FicheError> {
    let now = Utc::now().naive_utc();
    match fiche::get_by_patient(conn, patient_id)? {
        Some(mut existing) => {
            merge(&mut existing, fields);
            existing.updated_at = Some(now);
            fiche::update_fiche(conn, &existing)?;
            Ok(existing)
        }
        None => {
            fiche::insert_fiche(conn, patient_id, fields, now)?;
            fiche::get_by_patient(conn, patient_id)?.ok_or(FicheError::NotFound)
        }
    }
}

/// Update-only variant; fails when the patient has no fiche yet.
pub fn update_fiche(
    conn: &Connection,
    patient_id: i64,
    fields: &FicheUpdate,
) -> Result<FichePatient, FicheError> {
    let mut existing = fiche::get_by_patient(conn, patient_id)?.ok_or(FicheError::NotFound)?;
    merge(&mut existing, fields);
    existing.updated_at = Some(Utc::now().naive_utc());
    fiche::update_fiche(conn, &existing)?;
    Ok(existing)
}

fn accepted_content_type(content_type: Option<&str>) -> bool {
    matches!(content_type, Some(t) if t.starts_with("image/") || t == "application/pdf")
}

/// Attach (or replace) the single fiche document for `patient`. Accepts
/// images and PDFs only; creates the fiche on the fly for patients without
/// one, pre-filling their names.
pub fn attach_document(
    conn: &Connection,
    storage: &FileStore,
    patient: &User,
    file: &UploadedFile,
) -> Result<FichePatient, FicheError> {
    if file.bytes.is_empty() {
        return Err(FicheError::EmptyFile);
    }
    if !accepted_content_type(file.content_type.as_deref()) {
        return Err(FicheError::UnsupportedDocumentType);
    }

    let now = Utc::now().naive_utc();
    let current = match fiche::get_by_patient(conn, patient.id)? {
        Some(existing) => existing,
        None => {
            let seed = FicheUpdate {
                first_name: Some(patient.first_name.clone()),
                last_name: Some(patient.last_name.clone()),
                ..Default::default()
            };
            fiche::insert_fiche(conn, patient.id, &seed, now)?;
            fiche::get_by_patient(conn, patient.id)?.ok_or(FicheError::NotFound)?
        }
    };

    // Replace: drop the old file and its mirrored document rows
    if let Some(old_path) = &current.document_path {
        storage.delete(old_path);
        document::delete_for_fiche(conn, current.id)?;
    }

    let stored_path = storage.store(&file.name, &file.bytes, Some(DOCUMENTS_DIR))?;
    fiche::set_document(
        conn,
        current.id,
        &file.name,
        &stored_path,
        file.content_type.as_deref(),
        file.bytes.len() as i64,
        now,
    )?;
    document::insert_fiche_document(
        conn,
        current.id,
        &file.name,
        &stored_path,
        file.content_type.as_deref(),
        file.bytes.len() as i64,
        now,
    )?;

    tracing::info!(patient_id = patient.id, path = %stored_path, "Fiche document attached");
    fiche::get_by_patient(conn, patient.id)?.ok_or(FicheError::NotFound)
}

/// The attached document, ready for streaming: bytes, content type, and the
/// original file name.
pub fn load_document(
    conn: &Connection,
    storage: &FileStore,
    patient_id: i64,
) -> Result<(Vec<u8>, String, String), FicheError> {
    let current = fiche::get_by_patient(conn, patient_id)?.ok_or(FicheError::NotFound)?;
    let path = current.document_path.ok_or(FicheError::NoDocument)?;

    // Older rows stored the bare file name without the subdirectory.
    let qualified = if path.contains('/') {
        path
    } else {
        format!("{DOCUMENTS_DIR}/{path}")
    };

    let bytes = storage.load(&qualified)?;
    let content_type = current
        .document_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let name = current
        .document_name
        .unwrap_or_else(|| "document".to_string());
    Ok((bytes, content_type, name))
}
