//! Notification side effects fired by the other workflows.
//!
//! Creation rides in the caller's connection so a failed workflow does not
//! leave orphaned notifications behind. Reads go straight to the
//! repository; there is no push channel, clients poll.

use rusqlite::Connection;

use crate::db::repository::notification;
use crate::db::DatabaseError;
use crate::models::enums::NotificationType;

/// Insert an unread notification for `user_id`.
pub fn notify(
    conn: &Connection,
    user_id: i64,
    message: &str,
    notification_type: NotificationType,
    link: Option<&str>,
) -> Result<(), DatabaseError> {
    let now = chrono::Utc::now().naive_utc();
    notification::insert_notification(conn, user_id, message, notification_type, link, now)?;
    tracing::debug!(user_id, kind = notification_type.as_str(), "Notification created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{role, user};
    use chrono::Utc;

    #[test]
    fn notify_creates_unread_row() {
        let conn = open_memory_database().unwrap();
        let role = role::find_role_by_name(&conn, "patient").unwrap().unwrap();
        let user_id = user::insert_user(
            &conn,
            "A",
            "B",
            "a@x.tn",
            "h",
            role.id,
            Utc::now().naive_utc(),
        )
        .unwrap();

        notify(
            &conn,
            user_id,
            "Your appointment status has been updated to accepted",
            NotificationType::AppointmentUpdated,
            Some("/patient/appointments/1"),
        )
        .unwrap();

        assert_eq!(notification::unread_count(&conn, user_id).unwrap(), 1);
    }
}
