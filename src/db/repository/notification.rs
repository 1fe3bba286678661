use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::enums::NotificationType;
use crate::models::Notification;

struct NotificationRow {
    id: i64,
    user_id: i64,
    message: String,
    notification_type: String,
    link: Option<String>,
    is_read: i64,
    created_at: NaiveDateTime,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        notification_type: row.get(3)?,
        link: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn notification_from_row(row: NotificationRow) -> Result<Notification, DatabaseError> {
    Ok(Notification {
        id: row.id,
        user_id: row.user_id,
        message: row.message,
        notification_type: NotificationType::from_str(&row.notification_type)?,
        link: row.link,
        is_read: row.is_read != 0,
        created_at: row.created_at,
    })
}

pub fn insert_notification(
    conn: &Connection,
    user_id: i64,
    message: &str,
    notification_type: NotificationType,
    link: Option<&str>,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (user_id, message, type, link, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![user_id, message, notification_type.as_str(), link, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message, type, link, is_read, created_at
         FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let rows = collect(stmt.query_map(params![user_id], read_row)?);
    rows
}

pub fn list_unread_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message, type, link, is_read, created_at
         FROM notifications WHERE user_id = ?1 AND is_read = 0
         ORDER BY created_at DESC, id DESC",
    )?;
    let rows = collect(stmt.query_map(params![user_id], read_row)?);
    rows
}

pub fn unread_count(conn: &Connection, user_id: i64) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Mark one notification read, scoped to its owner. Returns whether a row
/// matched; marking an already-read notification is a no-op, not an error.
pub fn mark_read(conn: &Connection, id: i64, user_id: i64) -> Result<bool, DatabaseError> {
    let rows = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(rows > 0)
}

pub fn mark_all_read(conn: &Connection, user_id: i64) -> Result<usize, DatabaseError> {
    let rows = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
        params![user_id],
    )?;
    Ok(rows)
}

fn collect(
    rows: rusqlite::MappedRows<'_, impl FnMut(&Row<'_>) -> rusqlite::Result<NotificationRow>>,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut notifications = Vec::new();
    for row in rows {
        notifications.push(notification_from_row(row?)?);
    }
    Ok(notifications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{role, user};
    use chrono::Utc;

    fn seed_user(conn: &Connection, email: &str) -> i64 {
        let role = role::find_role_by_name(conn, "doctor").unwrap().unwrap();
        user::insert_user(conn, "A", "B", email, "h", role.id, Utc::now().naive_utc()).unwrap()
    }

    #[test]
    fn created_unread_and_counted() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_user(&conn, "d@x.tn");
        let now = Utc::now().naive_utc();

        insert_notification(
            &conn,
            doctor,
            "New appointment",
            NotificationType::NewAppointment,
            Some("/doctor/appointments/1"),
            now,
        )
        .unwrap();

        let all = list_for_user(&conn, doctor).unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_read);
        assert_eq!(all[0].link.as_deref(), Some("/doctor/appointments/1"));
        assert_eq!(unread_count(&conn, doctor).unwrap(), 1);
    }

    #[test]
    fn mark_read_is_idempotent_and_owner_scoped() {
        let conn = open_memory_database().unwrap();
        let owner = seed_user(&conn, "owner@x.tn");
        let other = seed_user(&conn, "other@x.tn");
        let now = Utc::now().naive_utc();
        let id = insert_notification(
            &conn,
            owner,
            "msg",
            NotificationType::AppointmentUpdated,
            None,
            now,
        )
        .unwrap();

        // Someone else cannot mark it
        assert!(!mark_read(&conn, id, other).unwrap());
        assert_eq!(unread_count(&conn, owner).unwrap(), 1);

        // Marking twice leaves exactly one read row
        assert!(mark_read(&conn, id, owner).unwrap());
        assert!(mark_read(&conn, id, owner).unwrap());
        assert_eq!(unread_count(&conn, owner).unwrap(), 0);
        assert_eq!(list_for_user(&conn, owner).unwrap().len(), 1);
    }

    #[test]
    fn mark_all_read_bulk() {
        let conn = open_memory_database().unwrap();
        let owner = seed_user(&conn, "owner@x.tn");
        let now = Utc::now().naive_utc();
        for i in 0..3 {
            insert_notification(
                &conn,
                owner,
                &format!("msg {i}"),
                NotificationType::AppointmentUpdated,
                None,
                now,
            )
            .unwrap();
        }

        assert_eq!(mark_all_read(&conn, owner).unwrap(), 3);
        assert_eq!(unread_count(&conn, owner).unwrap(), 0);
        assert!(list_unread_for_user(&conn, owner).unwrap().is_empty());
    }
}
