use chrono::NaiveDateTime;
use serde::Serialize;

/// Seeded role lookup row. `member_count` counts registrations.
#[derive(Debug, Clone, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub member_count: i64,
    pub created_at: NaiveDateTime,
}

/// Short-lived numeric code emailed to confirm account ownership.
#[derive(Debug, Clone)]
pub struct ActivationToken {
    pub id: i64,
    pub code: String,
    pub user_id: i64,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub validated_at: Option<NaiveDateTime>,
}
