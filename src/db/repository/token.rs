use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::ActivationToken;

pub fn insert_activation_token(
    conn: &Connection,
    user_id: i64,
    code: &str,
    created_at: NaiveDateTime,
    expires_at: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO activation_tokens (code, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![code, user_id, created_at, expires_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Latest token carrying this code, if any.
pub fn find_activation_token(
    conn: &Connection,
    code: &str,
) -> Result<Option<ActivationToken>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, code, user_id, created_at, expires_at, validated_at
         FROM activation_tokens WHERE code = ?1 ORDER BY id DESC LIMIT 1",
        params![code],
        |row| {
            Ok(ActivationToken {
                id: row.get(0)?,
                code: row.get(1)?,
                user_id: row.get(2)?,
                created_at: row.get(3)?,
                expires_at: row.get(4)?,
                validated_at: row.get(5)?,
            })
        },
    );
    match result {
        Ok(token) => Ok(Some(token)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn mark_token_validated(
    conn: &Connection,
    token_id: i64,
    at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE activation_tokens SET validated_at = ?2 WHERE id = ?1",
        params![token_id, at],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ActivationToken".into(),
            id: token_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{role, user};
    use chrono::{Duration, Utc};

    #[test]
    fn token_round_trip_and_validation() {
        let conn = open_memory_database().unwrap();
        let role = role::find_role_by_name(&conn, "patient").unwrap().unwrap();
        let now = Utc::now().naive_utc();
        let user_id =
            user::insert_user(&conn, "Ines", "Ben Ali", "ines@x.tn", "hash", role.id, now).unwrap();

        let token_id =
            insert_activation_token(&conn, user_id, "482913", now, now + Duration::minutes(15))
                .unwrap();

        let token = find_activation_token(&conn, "482913").unwrap().unwrap();
        assert_eq!(token.id, token_id);
        assert_eq!(token.user_id, user_id);
        assert!(token.validated_at.is_none());

        mark_token_validated(&conn, token_id, now).unwrap();
        let token = find_activation_token(&conn, "482913").unwrap().unwrap();
        assert!(token.validated_at.is_some());

        assert!(find_activation_token(&conn, "000000").unwrap().is_none());
    }
}
