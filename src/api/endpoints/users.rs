//! Profile endpoints, stored file retrieval, and the doctor/secretary
//! assignment surface.

use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::endpoints::{file_response, read_upload};
use crate::api::error::ApiError;
use crate::api::types::{require_role, ApiContext, CurrentUser};
use crate::models::enums::{RoleName, SecretaryStatus};
use crate::models::User;
use crate::storage::{CVS_DIR, PROFILE_PICTURES_DIR};
use crate::users::{self, ChangePasswordRequest, UpdateProfileRequest};

/// `GET /api/users/profile`
pub async fn profile(Extension(CurrentUser(account)): Extension<CurrentUser>) -> Json<User> {
    Json(account)
}

/// `PUT /api/users/profile`
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(users::update_profile(&conn, account.id, &request)?))
}

/// `PUT /api/users/password`
pub async fn change_password(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.state.open_db()?;
    users::change_password(&conn, account.id, &request)?;
    Ok(Json(serde_json::json!({ "message": "Password changed" })))
}

/// `POST /api/users/profile/picture` — multipart `file` part.
pub async fn upload_profile_picture(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<User>, ApiError> {
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
    let upload =
        upload.ok_or_else(|| ApiError::BadRequest("Please select a file to upload".to_string()))?;

    let conn = ctx.state.open_db()?;
    let updated =
        users::update_profile_picture(&conn, &ctx.state.storage, account.id, &upload)?;
    Ok(Json(updated))
}

fn stream_stored_file(
    ctx: &ApiContext,
    subdirectory: &str,
    file_name: &str,
) -> Result<Response, ApiError> {
    let relative = format!("{subdirectory}/{file_name}");
    let bytes = ctx.state.storage.load(&relative)?;
    let content_type = mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string();
    file_response(bytes, &content_type, file_name)
}

/// `GET /api/users/profile/picture/:file`
pub async fn get_profile_picture(
    State(ctx): State<ApiContext>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    stream_stored_file(&ctx, PROFILE_PICTURES_DIR, &file_name)
}

/// `GET /api/users/cv/:file`
pub async fn get_cv(
    State(ctx): State<ApiContext>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    stream_stored_file(&ctx, CVS_DIR, &file_name)
}

// ── Doctor queries ──────────────────────────────────────

/// `GET /api/users/doctors`
pub async fn doctors(State(ctx): State<ApiContext>) -> Result<Json<Vec<User>>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(users::list_doctors(&conn)?))
}

/// `GET /api/users/doctors/unassigned`
pub async fn unassigned_doctors(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_role(&account, RoleName::Secretary)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(users::list_unassigned_doctors(&conn)?))
}

/// `GET /api/users/doctors/:id`
pub async fn doctor_by_id(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(users::get_doctor(&conn, id)?))
}

// ── Secretary assignment ────────────────────────────────

/// `POST /api/users/secretary/apply` — multipart with a `doctor_id` text
/// field and an optional `cv` file part.
pub async fn apply_as_secretary(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<User>, ApiError> {
    require_role(&account, RoleName::Secretary)?;

    let mut doctor_id: Option<i64> = None;
    let mut cv = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart request: {e}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("doctor_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid doctor_id field: {e}")))?;
                doctor_id = Some(text.trim().parse().map_err(|_| {
                    ApiError::BadRequest(format!("doctor_id is not a number: {text}"))
                })?);
            }
            Some("cv") | Some("file") => cv = Some(read_upload(field).await?),
            _ => {}
        }
    }
    let doctor_id =
        doctor_id.ok_or_else(|| ApiError::BadRequest("doctor_id is required".to_string()))?;

    let conn = ctx.state.open_db()?;
    let updated = users::apply_as_secretary(
        &conn,
        &ctx.state.storage,
        &account,
        doctor_id,
        cv.as_ref(),
    )?;
    Ok(Json(updated))
}

/// `GET /api/users/secretary/doctor`
pub async fn my_assigned_doctor(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<User>, ApiError> {
    require_role(&account, RoleName::Secretary)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(users::assigned_doctor(&conn, &account)?))
}

/// `GET /api/users/doctor/secretary-applications`
pub async fn secretary_applications(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(users::secretary_applications(&conn, &account)?))
}

/// `GET /api/users/doctor/secretaries`
pub async fn assigned_secretaries(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(users::assigned_secretaries(&conn, &account)?))
}

#[derive(Deserialize)]
pub struct SecretaryActionRequest {
    pub secretary_id: i64,
    /// `approved` or `rejected`.
    pub action: SecretaryStatus,
}

/// `POST /api/users/doctor/process-secretary`
pub async fn process_secretary(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Json(request): Json<SecretaryActionRequest>,
) -> Result<Json<User>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let conn = ctx.state.open_db()?;
    let updated = users::process_secretary_application(
        &conn,
        &account,
        request.secretary_id,
        request.action,
    )?;
    Ok(Json(updated))
}

/// `DELETE /api/users/doctor/secretary/:secretary_id`
pub async fn remove_secretary(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(secretary_id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(users::remove_secretary(&conn, &account, secretary_id)?))
}
