//! Appointment endpoints: booking, role-scoped listings, the status
//! workflow, and the per-appointment patient record.

use axum::extract::{Multipart, Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::endpoints::read_upload;
use crate::api::error::ApiError;
use crate::api::types::{require_any_role, require_role, ApiContext, CurrentUser};
use crate::appointments::{self, BookingRequest, PatientRecord};
use crate::models::enums::{AppointmentStatus, RoleName};
use crate::models::{Appointment, AppointmentView, DentalIntervention, NewIntervention};

/// `POST /api/appointments/book` — patients book for themselves.
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Appointment>, ApiError> {
    require_role(&account, RoleName::Patient)?;
    let conn = ctx.state.open_db()?;
    let booked = appointments::book(&conn, account.id, &request)?;
    Ok(Json(booked))
}

/// `GET /api/appointments/my-appointments`
pub async fn my_appointments(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    require_role(&account, RoleName::Patient)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(appointments::list_for_patient(&conn, account.id)?))
}

/// `GET /api/appointments/my-doctor-appointments`
pub async fn my_doctor_appointments(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(appointments::list_for_doctor(&conn, account.id)?))
}

/// `GET /api/appointments/secretary/:secretary_id` — the path id must be
/// the caller's own.
pub async fn secretary_appointments(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(secretary_id): Path<i64>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    require_role(&account, RoleName::Secretary)?;
    if account.id != secretary_id {
        return Err(ApiError::Forbidden(
            "Secretaries can only list their own appointment book".to_string(),
        ));
    }
    let conn = ctx.state.open_db()?;
    Ok(Json(appointments::list_for_secretary(&conn, secretary_id)?))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

/// `PUT /api/appointments/status/:appointment_id` — secretary path.
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Appointment>, ApiError> {
    require_role(&account, RoleName::Secretary)?;
    let conn = ctx.state.open_db()?;
    let updated = appointments::update_status_by_secretary(
        &conn,
        appointment_id,
        request.status,
        account.id,
    )?;
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct AppointmentIdQuery {
    pub appointment_id: i64,
}

/// `PUT /api/appointments/update-my-appointment-status` — doctor path; the
/// handler owns the ownership check.
pub async fn update_my_appointment_status(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Query(query): Query<AppointmentIdQuery>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Appointment>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let conn = ctx.state.open_db()?;

    let owned = appointments::find(&conn, query.appointment_id)?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;
    if owned.doctor_id != account.id {
        return Err(ApiError::Forbidden(
            "You can only update your own appointments".to_string(),
        ));
    }

    let updated =
        appointments::update_status_by_doctor(&conn, query.appointment_id, request.status)?;
    Ok(Json(updated))
}

const RECORD_ROLES: &[RoleName] = &[RoleName::Patient, RoleName::Doctor, RoleName::Secretary];

/// `POST /api/appointments/:id/fiche-patient` — multipart with a
/// `patient_data` JSON field plus any number of `files` parts.
pub async fn save_record(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(appointment_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<PatientRecord>, ApiError> {
    require_any_role(&account, RECORD_ROLES)?;

    let mut patient_data = String::from("{}");
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart request: {e}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("patient_data") => {
                patient_data = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid patient_data field: {e}")))?;
            }
            Some("files") | Some("file") => files.push(read_upload(field).await?),
            _ => {}
        }
    }

    let conn = ctx.state.open_db()?;
    let record = appointments::save_patient_record(
        &conn,
        &ctx.state.storage,
        &account,
        appointment_id,
        &patient_data,
        &files,
    )?;
    Ok(Json(record))
}

/// `GET /api/appointments/:id/fiche-patient`
pub async fn get_record(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<PatientRecord>, ApiError> {
    require_any_role(&account, RECORD_ROLES)?;
    let conn = ctx.state.open_db()?;
    let record = appointments::get_patient_record(&conn, &account, appointment_id)?;
    Ok(Json(record))
}

/// `GET /api/appointments/:id/interventions`
pub async fn list_interventions(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Vec<DentalIntervention>>, ApiError> {
    require_any_role(&account, RECORD_ROLES)?;
    let conn = ctx.state.open_db()?;
    Ok(Json(appointments::list_interventions(
        &conn,
        &account,
        appointment_id,
    )?))
}

/// `POST /api/appointments/:id/interventions`
pub async fn add_intervention(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(appointment_id): Path<i64>,
    Json(payload): Json<NewIntervention>,
) -> Result<Json<DentalIntervention>, ApiError> {
    require_role(&account, RoleName::Doctor)?;
    let conn = ctx.state.open_db()?;
    let added = appointments::add_intervention(&conn, &account, appointment_id, &payload)?;
    Ok(Json(added))
}
