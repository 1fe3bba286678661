use chrono::NaiveDateTime;
use serde::Serialize;

use super::enums::DocumentKind;

/// A stored upload. The kind discriminator binds the row exclusively to
/// either an appointment or a patient fiche; the matching owner id is set,
/// the other is NULL.
#[derive(Debug, Clone, Serialize)]
pub struct StoredDocument {
    pub id: i64,
    pub kind: DocumentKind,
    pub appointment_id: Option<i64>,
    pub fiche_id: Option<i64>,
    /// Original client-supplied file name.
    pub name: String,
    /// Relative path under the upload root.
    pub file_path: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub uploaded_at: NaiveDateTime,
}
