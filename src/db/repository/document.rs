use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::enums::DocumentKind;
use crate::models::StoredDocument;

struct DocumentRow {
    id: i64,
    kind: String,
    appointment_id: Option<i64>,
    fiche_id: Option<i64>,
    name: String,
    file_path: String,
    content_type: Option<String>,
    size_bytes: Option<i64>,
    uploaded_at: NaiveDateTime,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        appointment_id: row.get(2)?,
        fiche_id: row.get(3)?,
        name: row.get(4)?,
        file_path: row.get(5)?,
        content_type: row.get(6)?,
        size_bytes: row.get(7)?,
        uploaded_at: row.get(8)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<StoredDocument, DatabaseError> {
    Ok(StoredDocument {
        id: row.id,
        kind: DocumentKind::from_str(&row.kind)?,
        appointment_id: row.appointment_id,
        fiche_id: row.fiche_id,
        name: row.name,
        file_path: row.file_path,
        content_type: row.content_type,
        size_bytes: row.size_bytes,
        uploaded_at: row.uploaded_at,
    })
}

pub fn insert_appointment_document(
    conn: &Connection,
    appointment_id: i64,
    name: &str,
    file_path: &str,
    content_type: Option<&str>,
    size_bytes: i64,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO documents (kind, appointment_id, name, file_path, content_type, size_bytes, uploaded_at)
         VALUES ('appointment', ?1, ?2, ?3, ?4, ?5, ?6)",
        params![appointment_id, name, file_path, content_type, size_bytes, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_fiche_document(
    conn: &Connection,
    fiche_id: i64,
    name: &str,
    file_path: &str,
    content_type: Option<&str>,
    size_bytes: i64,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO documents (kind, fiche_id, name, file_path, content_type, size_bytes, uploaded_at)
         VALUES ('patient', ?1, ?2, ?3, ?4, ?5, ?6)",
        params![fiche_id, name, file_path, content_type, size_bytes, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_for_appointment(
    conn: &Connection,
    appointment_id: i64,
) -> Result<Vec<StoredDocument>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, appointment_id, fiche_id, name, file_path, content_type, size_bytes, uploaded_at
         FROM documents WHERE appointment_id = ?1 ORDER BY uploaded_at",
    )?;
    let rows = stmt.query_map(params![appointment_id], read_row)?;
    let mut documents = Vec::new();
    for row in rows {
        documents.push(document_from_row(row?)?);
    }
    Ok(documents)
}

pub fn list_for_fiche(
    conn: &Connection,
    fiche_id: i64,
) -> Result<Vec<StoredDocument>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, appointment_id, fiche_id, name, file_path, content_type, size_bytes, uploaded_at
         FROM documents WHERE fiche_id = ?1 ORDER BY uploaded_at",
    )?;
    let rows = stmt.query_map(params![fiche_id], read_row)?;
    let mut documents = Vec::new();
    for row in rows {
        documents.push(document_from_row(row?)?);
    }
    Ok(documents)
}

/// Remove every document row attached to a fiche. Returns deleted count.
pub fn delete_for_fiche(conn: &Connection, fiche_id: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM documents WHERE fiche_id = ?1",
        params![fiche_id],
    )?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{appointment, fiche, role, user};
    use crate::models::enums::{AppointmentType, CaseType};
    use crate::models::FicheUpdate;
    use chrono::Utc;

    #[test]
    fn ownership_is_mutually_exclusive() {
        let conn = open_memory_database().unwrap();
        // kind=appointment with fiche_id set violates the CHECK
        let err = conn.execute(
            "INSERT INTO documents (kind, appointment_id, fiche_id, name, file_path, uploaded_at)
             VALUES ('appointment', NULL, 1, 'x', 'p', '2024-01-01T00:00:00')",
            [],
        );
        assert!(err.is_err());
    }

    #[test]
    fn fiche_documents_round_trip_and_clear() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now().naive_utc();
        let patient_role = role::find_role_by_name(&conn, "patient").unwrap().unwrap();
        let patient =
            user::insert_user(&conn, "A", "B", "p@x.tn", "h", patient_role.id, now).unwrap();
        let fiche_id = fiche::insert_fiche(&conn, patient, &FicheUpdate::default(), now).unwrap();

        insert_fiche_document(
            &conn,
            fiche_id,
            "xray.png",
            "documents/abc.png",
            Some("image/png"),
            1234,
            now,
        )
        .unwrap();

        let docs = list_for_fiche(&conn, fiche_id).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].kind, DocumentKind::Patient);
        assert_eq!(docs[0].fiche_id, Some(fiche_id));
        assert!(docs[0].appointment_id.is_none());

        assert_eq!(delete_for_fiche(&conn, fiche_id).unwrap(), 1);
        assert!(list_for_fiche(&conn, fiche_id).unwrap().is_empty());
    }

    #[test]
    fn appointment_documents_attach() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now().naive_utc();
        let patient_role = role::find_role_by_name(&conn, "patient").unwrap().unwrap();
        let doctor_role = role::find_role_by_name(&conn, "doctor").unwrap().unwrap();
        let patient =
            user::insert_user(&conn, "A", "B", "p@x.tn", "h", patient_role.id, now).unwrap();
        let doctor = user::insert_user(&conn, "C", "D", "d@x.tn", "h", doctor_role.id, now).unwrap();
        let appointment_id = appointment::insert_appointment(
            &conn,
            patient,
            doctor,
            now,
            CaseType::Normal,
            AppointmentType::Soin,
            None,
            now,
        )
        .unwrap();

        insert_appointment_document(
            &conn,
            appointment_id,
            "scan.pdf",
            "documents/def.pdf",
            Some("application/pdf"),
            99,
            now,
        )
        .unwrap();

        let docs = list_for_appointment(&conn, appointment_id).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].kind, DocumentKind::Appointment);
    }
}
