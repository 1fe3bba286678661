//! Registration, activation, and authentication endpoints.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::auth::{self, AuthenticationRequest, AuthenticationResponse, RegistrationRequest};
use crate::db::repository::role;
use crate::models::User;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /auth/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(request): Json<RegistrationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    auth::register(&conn, &ctx.state.mailer, &request).await?;
    Ok(Json(MessageResponse {
        message: "Account created. Check your email for the activation code.".to_string(),
    }))
}

/// `POST /auth/authenticate`
pub async fn authenticate(
    State(ctx): State<ApiContext>,
    Json(request): Json<AuthenticationRequest>,
) -> Result<Json<AuthenticationResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let response = auth::authenticate(
        &conn,
        &ctx.state.settings.jwt_secret,
        ctx.state.settings.token_ttl_hours,
        &request,
    )?;
    Ok(Json(response))
}

#[derive(Deserialize)]
pub struct ActivateQuery {
    pub token: String,
}

/// `GET /auth/activate-account?token=`
pub async fn activate_account(
    State(ctx): State<ApiContext>,
    Query(query): Query<ActivateQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    auth::activate_account(&conn, &ctx.state.mailer, &query.token).await?;
    Ok(Json(MessageResponse {
        message: "Account activated".to_string(),
    }))
}

/// `GET /auth/roles` — public listing of registrable roles.
pub async fn roles(State(ctx): State<ApiContext>) -> Result<Json<Vec<String>>, ApiError> {
    let conn = ctx.state.open_db()?;
    Ok(Json(role::list_role_names(&conn)?))
}

/// `GET /auth/current-user`
pub async fn current_user(
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Json<User> {
    Json(account)
}
