use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::Role;

pub fn find_role_by_name(conn: &Connection, name: &str) -> Result<Option<Role>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, name, member_count, created_at FROM roles WHERE name = ?1",
        params![name],
        |row| {
            Ok(Role {
                id: row.get(0)?,
                name: row.get(1)?,
                member_count: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    );
    match result {
        Ok(role) => Ok(Some(role)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn increment_member_count(conn: &Connection, role_id: i64) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE roles SET member_count = member_count + 1 WHERE id = ?1",
        params![role_id],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Role".into(),
            id: role_id.to_string(),
        });
    }
    Ok(())
}

pub fn list_role_names(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT name FROM roles ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}
