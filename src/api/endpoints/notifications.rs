//! Notification endpoints. Clients poll; there is no push channel.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::db::repository::notification;
use crate::models::Notification;

/// `GET /api/notifications`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(notification::list_for_user(&conn, account.id)?))
}

/// `GET /api/notifications/unread`
pub async fn unread(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(notification::list_unread_for_user(&conn, account.id)?))
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// `GET /api/notifications/unread-count`
pub async fn unread_count(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let count = notification::unread_count(&conn, account.id)?;
    Ok(Json(UnreadCountResponse { count }))
}

/// `PUT /api/notifications/mark-read/:id` — idempotent, owner-scoped.
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(notification_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.state.open_db()?;
    notification::mark_read(&conn, notification_id, account.id)?;
    Ok(Json(serde_json::json!({})))
}

/// `PUT /api/notifications/mark-all-read`
pub async fn mark_all_read(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.state.open_db()?;
    let updated = notification::mark_all_read(&conn, account.id)?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
