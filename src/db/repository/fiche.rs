use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::{FichePatient, FicheUpdate};

const FICHE_COLUMNS: &str = "id, patient_id, first_name, last_name, birth_date, profession, \
     phone, address, referred_by, sex, general_state, surgical_history, current_medications, \
     allergies, dental_observations, document_name, document_path, document_type, document_size, \
     created_at, updated_at";

fn read_row(row: &Row<'_>) -> rusqlite::Result<FichePatient> {
    Ok(FichePatient {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        birth_date: row.get::<_, Option<NaiveDate>>(4)?,
        profession: row.get(5)?,
        phone: row.get(6)?,
        address: row.get(7)?,
        referred_by: row.get(8)?,
        sex: row.get(9)?,
        general_state: row.get(10)?,
        surgical_history: row.get(11)?,
        current_medications: row.get(12)?,
        allergies: row.get(13)?,
        dental_observations: row.get(14)?,
        document_name: row.get(15)?,
        document_path: row.get(16)?,
        document_type: row.get(17)?,
        document_size: row.get(18)?,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,
    })
}

pub fn get_by_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<FichePatient>, DatabaseError> {
    let sql = format!("SELECT {FICHE_COLUMNS} FROM fiches WHERE patient_id = ?1");
    let result = conn.query_row(&sql, params![patient_id], read_row);
    match result {
        Ok(fiche) => Ok(Some(fiche)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_fiche(
    conn: &Connection,
    patient_id: i64,
    fields: &FicheUpdate,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO fiches
         (patient_id, first_name, last_name, birth_date, profession, phone, address,
          referred_by, sex, general_state, surgical_history, current_medications,
          allergies, dental_observations, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            patient_id,
            fields.first_name,
            fields.last_name,
            fields.birth_date,
            fields.profession,
            fields.phone,
            fields.address,
            fields.referred_by,
            fields.sex,
            fields.general_state,
            fields.surgical_history,
            fields.current_medications,
            fields.allergies,
            fields.dental_observations,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Persist the full medical/demographic state of a loaded fiche.
pub fn update_fiche(conn: &Connection, fiche: &FichePatient) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE fiches SET first_name = ?2, last_name = ?3, birth_date = ?4, profession = ?5,
         phone = ?6, address = ?7, referred_by = ?8, sex = ?9, general_state = ?10,
         surgical_history = ?11, current_medications = ?12, allergies = ?13,
         dental_observations = ?14, updated_at = ?15
         WHERE id = ?1",
        params![
            fiche.id,
            fiche.first_name,
            fiche.last_name,
            fiche.birth_date,
            fiche.profession,
            fiche.phone,
            fiche.address,
            fiche.referred_by,
            fiche.sex,
            fiche.general_state,
            fiche.surgical_history,
            fiche.current_medications,
            fiche.allergies,
            fiche.dental_observations,
            fiche.updated_at,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "FichePatient".into(),
            id: fiche.id.to_string(),
        });
    }
    Ok(())
}

/// Replace the single-document columns.
pub fn set_document(
    conn: &Connection,
    fiche_id: i64,
    name: &str,
    path: &str,
    content_type: Option<&str>,
    size: i64,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE fiches SET document_name = ?2, document_path = ?3, document_type = ?4,
         document_size = ?5, updated_at = ?6 WHERE id = ?1",
        params![fiche_id, name, path, content_type, size, now],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "FichePatient".into(),
            id: fiche_id.to_string(),
        });
    }
    Ok(())
}
