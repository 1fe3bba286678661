//! Registration, account activation, and credential authentication.
//!
//! Registration creates a disabled account and issues a short-lived numeric
//! activation code; authentication rejects disabled accounts before ever
//! looking at the password and hands back a signed bearer token on success.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::password_hash::rand_core::OsRng;
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand::Rng;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::repository::{role, token, user};
use crate::db::DatabaseError;
use crate::mailer::Mailer;
use crate::models::User;

/// Activation codes expire this long after issue.
pub const ACTIVATION_CODE_TTL_MINUTES: i64 = 15;
const ACTIVATION_CODE_LENGTH: usize = 6;
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Role {0} is not initialised")]
    UnknownRole(String),
    #[error("Email already exists")]
    EmailTaken,
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
    #[error("User not found")]
    UserNotFound,
    #[error("Account is not enabled. Please activate your account.")]
    AccountDisabled,
    #[error("Account locked")]
    AccountLocked,
    #[error("Login and / or password is incorrect")]
    BadCredentials,
    #[error("Invalid activation code. Please request a new one.")]
    InvalidActivationCode,
    #[error("Activation code is expired. A new code has been sent to your email address.")]
    ActivationCodeExpired,
    #[error("Invalid or expired bearer token")]
    InvalidBearerToken,
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ── Passwords ───────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .to_string())
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

// ── Bearer tokens ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(secret: &str, ttl_hours: i64, user: &User) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        full_name: user.full_name(),
        role: user.role.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidBearerToken)
}

pub fn decode_token(secret: &str, bearer: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        bearer,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidBearerToken)
}

// ── Registration & activation ───────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// Must name one of the pre-seeded roles.
    pub role: String,
}

fn generate_activation_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Generate, persist, and deliver a fresh activation code for `user`.
///
/// Mail failure is logged, never propagated: the account row is already
/// committed and a later resend covers recovery.
async fn issue_activation_code(
    conn: &Connection,
    mailer: &Mailer,
    user: &User,
) -> Result<(), AuthError> {
    let code = generate_activation_code(ACTIVATION_CODE_LENGTH);
    let now = Utc::now().naive_utc();
    token::insert_activation_token(
        conn,
        user.id,
        &code,
        now,
        now + Duration::minutes(ACTIVATION_CODE_TTL_MINUTES),
    )?;
    if let Err(e) = mailer
        .send_activation_code(&user.email, &user.full_name(), &code)
        .await
    {
        tracing::error!(email = %user.email, error = %e, "Activation email delivery failed");
    }
    Ok(())
}

/// Create a disabled account and send its activation code.
pub async fn register(
    conn: &Connection,
    mailer: &Mailer,
    request: &RegistrationRequest,
) -> Result<i64, AuthError> {
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooShort);
    }

    let user_role = role::find_role_by_name(conn, &request.role)?
        .ok_or_else(|| AuthError::UnknownRole(request.role.clone()))?;

    if user::get_user_by_email(conn, &request.email)?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    role::increment_member_count(conn, user_role.id)?;
    let password_hash = hash_password(&request.password)?;
    let user_id = user::insert_user(
        conn,
        &request.first_name,
        &request.last_name,
        &request.email,
        &password_hash,
        user_role.id,
        Utc::now().naive_utc(),
    )?;
    tracing::info!(email = %request.email, role = %request.role, "User registered");

    let created = user::get_user(conn, user_id)?.ok_or(AuthError::UserNotFound)?;
    issue_activation_code(conn, mailer, &created).await?;
    Ok(user_id)
}

/// Enable the account behind an activation code.
///
/// An expired code fails the call but a replacement code is generated and
/// sent first, so the user can retry from their inbox.
pub async fn activate_account(
    conn: &Connection,
    mailer: &Mailer,
    code: &str,
) -> Result<(), AuthError> {
    let saved = token::find_activation_token(conn, code)?.ok_or(AuthError::InvalidActivationCode)?;

    let now = Utc::now().naive_utc();
    if now > saved.expires_at {
        tracing::warn!(user_id = saved.user_id, "Activation code expired, re-issuing");
        let account = user::get_user(conn, saved.user_id)?.ok_or(AuthError::UserNotFound)?;
        issue_activation_code(conn, mailer, &account).await?;
        return Err(AuthError::ActivationCodeExpired);
    }

    user::set_enabled(conn, saved.user_id, true)?;
    token::mark_token_validated(conn, saved.id, now)?;
    tracing::info!(user_id = saved.user_id, "Account activated");
    Ok(())
}

// ── Authentication ──────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationResponse {
    pub token: String,
    pub role: String,
}

pub fn authenticate(
    conn: &Connection,
    secret: &str,
    ttl_hours: i64,
    request: &AuthenticationRequest,
) -> Result<AuthenticationResponse, AuthError> {
    let account =
        user::get_user_by_email(conn, &request.email)?.ok_or(AuthError::UserNotFound)?;

    // Disabled accounts are rejected before any credential check.
    if !account.enabled {
        return Err(AuthError::AccountDisabled);
    }
    if account.locked {
        return Err(AuthError::AccountLocked);
    }
    if !verify_password(&account.password_hash, &request.password) {
        return Err(AuthError::BadCredentials);
    }

    let token = issue_token(secret, ttl_hours, &account)?;
    tracing::info!(email = %account.email, "Authentication succeeded");
    Ok(AuthenticationResponse {
        token,
        role: account.role,
    })
}
