use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::enums::SecretaryStatus;
use crate::models::User;

const USER_COLUMNS: &str = "u.id, u.first_name, u.last_name, u.email, u.password_hash, r.name, \
     u.phone, u.address, u.birth_date, u.enabled, u.locked, u.visible, \
     u.profile_picture_path, u.cv_path, u.certification_path, \
     u.assigned_doctor_id, u.secretary_status, u.created_at, u.updated_at";

struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    role: String,
    phone: Option<String>,
    address: Option<String>,
    birth_date: Option<NaiveDate>,
    enabled: i64,
    locked: i64,
    visible: i64,
    profile_picture_path: Option<String>,
    cv_path: Option<String>,
    certification_path: Option<String>,
    assigned_doctor_id: Option<i64>,
    secretary_status: String,
    created_at: NaiveDateTime,
    updated_at: Option<NaiveDateTime>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        role: row.get(5)?,
        phone: row.get(6)?,
        address: row.get(7)?,
        birth_date: row.get(8)?,
        enabled: row.get(9)?,
        locked: row.get(10)?,
        visible: row.get(11)?,
        profile_picture_path: row.get(12)?,
        cv_path: row.get(13)?,
        certification_path: row.get(14)?,
        assigned_doctor_id: row.get(15)?,
        secretary_status: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        password_hash: row.password_hash,
        role: row.role,
        phone: row.phone,
        address: row.address,
        birth_date: row.birth_date,
        enabled: row.enabled != 0,
        locked: row.locked != 0,
        visible: row.visible != 0,
        profile_picture_path: row.profile_picture_path,
        cv_path: row.cv_path,
        certification_path: row.certification_path,
        assigned_doctor_id: row.assigned_doctor_id,
        secretary_status: SecretaryStatus::from_str(&row.secretary_status)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn insert_user(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    email: &str,
    password_hash: &str,
    role_id: i64,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (first_name, last_name, email, password_hash, role_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![first_name, last_name, email, password_hash, role_id, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON u.role_id = r.id WHERE u.id = ?1"
    );
    let result = conn.query_row(&sql, params![id], read_row);
    match result {
        Ok(row) => Ok(Some(user_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON u.role_id = r.id WHERE u.email = ?1"
    );
    let result = conn.query_row(&sql, params![email], read_row);
    match result {
        Ok(row) => Ok(Some(user_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist the mutable columns of a loaded user. Role is not updatable here.
pub fn update_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE users SET first_name = ?2, last_name = ?3, email = ?4, password_hash = ?5,
         phone = ?6, address = ?7, birth_date = ?8, enabled = ?9, locked = ?10, visible = ?11,
         profile_picture_path = ?12, cv_path = ?13, certification_path = ?14,
         assigned_doctor_id = ?15, secretary_status = ?16, updated_at = ?17
         WHERE id = ?1",
        params![
            user.id,
            user.first_name,
            user.last_name,
            user.email,
            user.password_hash,
            user.phone,
            user.address,
            user.birth_date,
            user.enabled as i64,
            user.locked as i64,
            user.visible as i64,
            user.profile_picture_path,
            user.cv_path,
            user.certification_path,
            user.assigned_doctor_id,
            user.secretary_status.as_str(),
            user.updated_at,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user.id.to_string(),
        });
    }
    Ok(())
}

pub fn set_enabled(conn: &Connection, user_id: i64, enabled: bool) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE users SET enabled = ?2 WHERE id = ?1",
        params![user_id, enabled as i64],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user_id.to_string(),
        });
    }
    Ok(())
}

pub fn list_enabled_doctors(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON u.role_id = r.id
         WHERE r.name = 'doctor' AND u.enabled = 1 ORDER BY u.last_name, u.first_name"
    );
    collect_users(conn, &sql, params![])
}

/// Enabled doctors with no secretary pointing at them, whatever the
/// application status.
pub fn list_unassigned_doctors(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON u.role_id = r.id
         WHERE r.name = 'doctor' AND u.enabled = 1
           AND NOT EXISTS (SELECT 1 FROM users s WHERE s.assigned_doctor_id = u.id)
         ORDER BY u.last_name, u.first_name"
    );
    collect_users(conn, &sql, params![])
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON u.role_id = r.id
         WHERE u.id = ?1 AND r.name = 'doctor'"
    );
    let result = conn.query_row(&sql, params![id], read_row);
    match result {
        Ok(row) => Ok(Some(user_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_secretaries_for_doctor(
    conn: &Connection,
    doctor_id: i64,
    status: SecretaryStatus,
) -> Result<Vec<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON u.role_id = r.id
         WHERE u.assigned_doctor_id = ?1 AND u.secretary_status = ?2
         ORDER BY u.last_name, u.first_name"
    );
    collect_users(conn, &sql, params![doctor_id, status.as_str()])
}

fn collect_users(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, read_row)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}
