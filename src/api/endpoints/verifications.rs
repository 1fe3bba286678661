//! Doctor verification endpoints.

use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::endpoints::{file_response, read_upload};
use crate::api::error::ApiError;
use crate::api::types::{require_role, ApiContext, CurrentUser};
use crate::models::enums::{RoleName, VerificationStatus};
use crate::models::{DoctorVerification, VerificationRequest};
use crate::verification;

/// `POST /api/doctor-verifications`
pub async fn submit(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<DoctorVerification>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(verification::submit(&conn, &account, &request)?))
}

/// `GET /api/doctor-verifications/specialties`
pub async fn specialties() -> Json<Vec<&'static str>> {
    Json(verification::SPECIALTIES.to_vec())
}

/// `GET /api/doctor-verifications/doctor/:doctor_id`
pub async fn by_doctor(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<DoctorVerification>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(verification::get_by_doctor(&conn, doctor_id)?))
}

/// `GET /api/doctor-verifications/pending` — admin review queue.
pub async fn pending(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<DoctorVerification>>, ApiError> {
    require_role(&account, RoleName::Admin)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(verification::pending(&conn)?))
}

/// `GET /api/doctor-verifications/approved`
pub async fn approved(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<DoctorVerification>>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(verification::approved(&conn)?))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: VerificationStatus,
    pub message: Option<String>,
}

/// `PUT /api/doctor-verifications/:id/status` — admin only.
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(verification_id): Path<i64>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<DoctorVerification>, ApiError> {
    require_role(&account, RoleName::Admin)?;
    let conn = ctx.state.open_db()?;
    let updated = verification::set_status(
        &conn,
        verification_id,
        request.status,
        request.message.as_deref(),
    )?;
    Ok(Json(updated))
}

async fn single_file(mut multipart: Multipart) -> Result<crate::storage::UploadedFile, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart request: {e}")))?
    {
        if field.name() == Some("file") {
            upload = Some(read_upload(field).await?);
        }
    }
    upload.ok_or_else(|| ApiError::BadRequest("Please select a file to upload".to_string()))
}

/// Doctors may only touch their own application.
fn check_owner(
    conn: &rusqlite::Connection,
    verification_id: i64,
    doctor_id: i64,
) -> Result<(), ApiError> {
    let existing = verification::get_by_doctor(conn, doctor_id)?;
    if existing.id != verification_id {
        return Err(ApiError::Forbidden(
            "You can only modify your own verification".to_string(),
        ));
    }
    Ok(())
}

/// `POST /api/doctor-verifications/:id/cabinet-photo`
pub async fn upload_cabinet_photo(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(verification_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<DoctorVerification>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let upload = single_file(multipart).await?;
    let conn = ctx.state.open_db()?;
    check_owner(&conn, verification_id, account.id)?;
    let updated =
        verification::upload_cabinet_photo(&conn, &ctx.state.storage, verification_id, &upload)?;
    Ok(Json(updated))
}

/// `POST /api/doctor-verifications/:id/diploma-photo`
pub async fn upload_diploma(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(verification_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<DoctorVerification>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let upload = single_file(multipart).await?;
    let conn = ctx.state.open_db()?;
    check_owner(&conn, verification_id, account.id)?;
    let updated =
        verification::upload_diploma(&conn, &ctx.state.storage, verification_id, &upload)?;
    Ok(Json(updated))
}

fn stream_photo(ctx: &ApiContext, path: Option<&str>) -> Result<Response, ApiError> {
    let relative =
        path.ok_or_else(|| ApiError::NotFound("No document uploaded yet".to_string()))?;
    let bytes = ctx.state.storage.load(relative)?;
    let file_name = relative.rsplit('/').next().unwrap_or(relative);
    let content_type = mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string();
    file_response(bytes, &content_type, file_name)
}

/// `GET /api/doctor-verifications/:id/cabinet-photo`
pub async fn get_cabinet_photo(
    State(ctx): State<ApiContext>,
    Path(verification_id): Path<i64>,
) -> Result<Response, ApiError> {
    let conn = ctx.state.open_db()?;
    let existing = crate::db::repository::verification::get_verification(&conn, verification_id)?
        .ok_or_else(|| ApiError::NotFound("Verification not found".to_string()))?;
    stream_photo(&ctx, existing.cabinet_photo_path.as_deref())
}

/// `GET /api/doctor-verifications/:id/diploma-photo`
pub async fn get_diploma(
    State(ctx): State<ApiContext>,
    Path(verification_id): Path<i64>,
) -> Result<Response, ApiError> {
    let conn = ctx.state.open_db()?;
    let existing = crate::db::repository::verification::get_verification(&conn, verification_id)?
        .ok_or_else(|| ApiError::NotFound("Verification not found".to_string()))?;
    stream_photo(&ctx, existing.diploma_photo_path.as_deref())
}
