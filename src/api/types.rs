//! Shared types for the API layer.

use std::sync::Arc;

use crate::api::error::ApiError;
use crate::models::enums::RoleName;
use crate::models::User;
use crate::state::AppState;

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
}

impl ApiContext {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

/// Authenticated user, injected into request extensions by the auth
/// middleware after token validation.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Route-level role guard. Roles are exact; admin gets no implicit pass.
pub fn require_role(user: &User, role: RoleName) -> Result<(), ApiError> {
    if user.has_role(role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Requires the {} role",
            role.as_str()
        )))
    }
}

pub fn require_any_role(user: &User, roles: &[RoleName]) -> Result<(), ApiError> {
    if roles.iter().any(|role| user.has_role(*role)) {
        Ok(())
    } else {
        let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
        Err(ApiError::Forbidden(format!(
            "Requires one of the roles: {}",
            names.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: &str) -> User {
        User {
            id: 1,
            first_name: "T".into(),
            last_name: "U".into(),
            email: "t@u.tn".into(),
            password_hash: "h".into(),
            role: role.into(),
            phone: None,
            address: None,
            birth_date: None,
            enabled: true,
            locked: false,
            visible: true,
            profile_picture_path: None,
            cv_path: None,
            certification_path: None,
            assigned_doctor_id: None,
            secretary_status: crate::models::enums::SecretaryStatus::None,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn role_guards_are_exact() {
        let doctor = user_with_role("doctor");
        assert!(require_role(&doctor, RoleName::Doctor).is_ok());
        assert!(require_role(&doctor, RoleName::Admin).is_err());

        let admin = user_with_role("admin");
        assert!(require_role(&admin, RoleName::Doctor).is_err());

        assert!(require_any_role(&doctor, &[RoleName::Patient, RoleName::Doctor]).is_ok());
        assert!(require_any_role(&doctor, &[RoleName::Patient, RoleName::Secretary]).is_err());
    }
}
