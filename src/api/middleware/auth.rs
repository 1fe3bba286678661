//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies the signature and
//! expiry, resolves the subject back to a live user row, and injects
//! `CurrentUser` into request extensions for downstream handlers. Looking
//! the user up on every request means disabling or locking an account cuts
//! off its outstanding tokens immediately.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::auth;
use crate::db::repository::user;

pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let claims = auth::decode_token(&ctx.state.settings.jwt_secret, &bearer)?;

    let conn = ctx.state.open_db()?;
    let account = user::get_user(&conn, claims.sub)?.ok_or(ApiError::Unauthorized)?;
    if !account.enabled || account.locked {
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(CurrentUser(account));
    Ok(next.run(req).await)
}
