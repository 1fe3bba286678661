//! Patient record ("fiche") endpoints, for the authenticated patient and
//! by patient id for clinic staff.

use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use axum::{Extension, Json};

use crate::api::endpoints::{file_response, read_upload};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::fiche;
use crate::models::enums::RoleName;
use crate::models::{FichePatient, FicheUpdate, User};

/// A fiche keyed by patient id is visible to the patient it belongs to and
/// to clinic staff, not to other patients.
fn check_fiche_access(account: &User, patient_id: i64) -> Result<(), ApiError> {
    if account.id == patient_id
        || account.has_role(RoleName::Doctor)
        || account.has_role(RoleName::Secretary)
        || account.has_role(RoleName::Admin)
    {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Not authorized to access this patient's fiche".to_string(),
        ))
    }
}

/// `GET /api/patients/me`
pub async fn me(Extension(CurrentUser(account)): Extension<CurrentUser>) -> Json<User> {
    Json(account)
}

/// `GET /api/patients/me/fiche`
pub async fn my_fiche(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<FichePatient>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(fiche::get_fiche(&conn, account.id)?))
}

/// `POST /api/patients/me/fiche` — create-or-merge.
pub async fn save_my_fiche(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Json(fields): Json<FicheUpdate>,
) -> Result<Json<FichePatient>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(fiche::upsert_fiche(&conn, account.id, &fields)?))
}

/// `PUT /api/patients/me/fiche` — update-only.
pub async fn update_my_fiche(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Json(fields): Json<FicheUpdate>,
) -> Result<Json<FichePatient>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(fiche::update_fiche(&conn, account.id, &fields)?))
}

/// `GET /api/patients/:patient_id/fiche`
pub async fn get_fiche(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(patient_id): Path<i64>,
) -> Result<Json<FichePatient>, ApiError> {
    check_fiche_access(&account, patient_id)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(fiche::get_fiche(&conn, patient_id)?))
}

/// `POST /api/patients/:patient_id/fiche`
pub async fn save_fiche(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(patient_id): Path<i64>,
    Json(fields): Json<FicheUpdate>,
) -> Result<Json<FichePatient>, ApiError> {
    check_fiche_access(&account, patient_id)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(fiche::upsert_fiche(&conn, patient_id, &fields)?))
}

/// `PUT /api/patients/:patient_id/fiche`
pub async fn update_fiche(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(patient_id): Path<i64>,
    Json(fields): Json<FicheUpdate>,
) -> Result<Json<FichePatient>, ApiError> {
    check_fiche_access(&account, patient_id)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(fiche::update_fiche(&conn, patient_id, &fields)?))
}

/// `GET /api/patients/me/fiche/document` — inline view.
pub async fn view_my_document(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let conn = ctx.state.open_db()?;
    let (bytes, content_type, name) =
        fiche::load_document(&conn, &ctx.state.storage, account.id)?;
    file_response(bytes, &content_type, &name)
}

/// `GET /api/patients/me/fiche/document/download`
pub async fn download_my_document(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let conn = ctx.state.open_db()?;
    let (bytes, content_type, name) =
        fiche::load_document(&conn, &ctx.state.storage, account.id)?;
    file_response(bytes, &content_type, &name)
}

/// `POST /api/patients/me/fiche/document` — multipart `file` part.
pub async fn upload_my_document(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<FichePatient>, ApiError> {
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
    let updated = fiche::attach_document(&conn, &ctx.state.storage, &account, &upload)?;
    Ok(Json(updated))
}
