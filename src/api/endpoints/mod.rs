//! Handlers per resource group, plus small shared helpers for multipart
//! uploads and file streaming.

pub mod appointments;
pub mod auth;
pub mod notifications;
pub mod patients;
pub mod users;
pub mod verifications;

use axum::extract::multipart::Field;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::storage::UploadedFile;

/// Drain one multipart field into an `UploadedFile`.
pub(crate) async fn read_upload(field: Field<'_>) -> Result<UploadedFile, ApiError> {
    let name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(|s| s.to_string());
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart upload: {e}")))?
        .to_vec();
    Ok(UploadedFile {
        name,
        content_type,
        bytes,
    })
}

/// Stream stored bytes back inline with the recorded content type.
pub(crate) fn file_response(
    bytes: Vec<u8>,
    content_type: &str,
    file_name: &str,
) -> Result<Response, ApiError> {
    let disposition = format!("inline; filename=\"{}\"", file_name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
