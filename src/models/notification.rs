use chrono::NaiveDateTime;
use serde::Serialize;

use super::enums::NotificationType;

/// In-app message for one user. Append-only except for the read flag.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Frontend route the notification points at.
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}
