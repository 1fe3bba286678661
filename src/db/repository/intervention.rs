use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::enums::InterventionStatus;
use crate::models::DentalIntervention;

struct InterventionRow {
    id: i64,
    appointment_id: i64,
    intervention_date: Option<NaiveDateTime>,
    description: Option<String>,
    cost: Option<f64>,
    amount_paid: Option<f64>,
    teeth_numbers: Option<String>,
    status: String,
    created_at: NaiveDateTime,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<InterventionRow> {
    Ok(InterventionRow {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        intervention_date: row.get(2)?,
        description: row.get(3)?,
        cost: row.get(4)?,
        amount_paid: row.get(5)?,
        teeth_numbers: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn intervention_from_row(row: InterventionRow) -> Result<DentalIntervention, DatabaseError> {
    Ok(DentalIntervention {
        id: row.id,
        appointment_id: row.appointment_id,
        intervention_date: row.intervention_date,
        description: row.description,
        cost: row.cost,
        amount_paid: row.amount_paid,
        teeth_numbers: row.teeth_numbers,
        status: InterventionStatus::from_str(&row.status)?,
        created_at: row.created_at,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn insert_intervention(
    conn: &Connection,
    appointment_id: i64,
    intervention_date: Option<NaiveDateTime>,
    description: Option<&str>,
    cost: Option<f64>,
    amount_paid: Option<f64>,
    teeth_numbers: Option<&str>,
    status: InterventionStatus,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO interventions
         (appointment_id, intervention_date, description, cost, amount_paid, teeth_numbers, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            appointment_id,
            intervention_date,
            description,
            cost,
            amount_paid,
            teeth_numbers,
            status.as_str(),
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_intervention(
    conn: &Connection,
    id: i64,
) -> Result<Option<DentalIntervention>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, appointment_id, intervention_date, description, cost, amount_paid,
         teeth_numbers, status, created_at FROM interventions WHERE id = ?1",
        params![id],
        read_row,
    );
    match result {
        Ok(row) => Ok(Some(intervention_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_for_appointment(
    conn: &Connection,
    appointment_id: i64,
) -> Result<Vec<DentalIntervention>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, appointment_id, intervention_date, description, cost, amount_paid,
         teeth_numbers, status, created_at
         FROM interventions WHERE appointment_id = ?1 ORDER BY created_at",
    )?;
    let rows = stmt.query_map(params![appointment_id], read_row)?;
    let mut interventions = Vec::new();
    for row in rows {
        interventions.push(intervention_from_row(row?)?);
    }
    Ok(interventions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{appointment, role, user};
    use crate::models::enums::{AppointmentType, CaseType};
    use chrono::Utc;

    fn seed_appointment(conn: &Connection) -> i64 {
        let now = Utc::now().naive_utc();
        let patient_role = role::find_role_by_name(conn, "patient").unwrap().unwrap();
        let doctor_role = role::find_role_by_name(conn, "doctor").unwrap().unwrap();
        let patient =
            user::insert_user(conn, "A", "B", "p@x.tn", "h", patient_role.id, now).unwrap();
        let doctor = user::insert_user(conn, "C", "D", "d@x.tn", "h", doctor_role.id, now).unwrap();
        appointment::insert_appointment(
            conn,
            patient,
            doctor,
            now,
            CaseType::Normal,
            AppointmentType::Soin,
            None,
            now,
        )
        .unwrap()
    }

    #[test]
    fn insert_and_list_in_order() {
        let conn = open_memory_database().unwrap();
        let appointment_id = seed_appointment(&conn);
        let now = Utc::now().naive_utc();

        insert_intervention(
            &conn,
            appointment_id,
            Some(now),
            Some("root canal, tooth 36"),
            Some(420.0),
            Some(100.0),
            Some("36"),
            InterventionStatus::Planned,
            now,
        )
        .unwrap();
        insert_intervention(
            &conn,
            appointment_id,
            None,
            Some("scaling"),
            Some(80.0),
            None,
            None,
            InterventionStatus::Completed,
            now,
        )
        .unwrap();

        let list = list_for_appointment(&conn, appointment_id).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].description.as_deref(), Some("root canal, tooth 36"));
        assert_eq!(list[0].status, InterventionStatus::Planned);
        assert_eq!(list[1].status, InterventionStatus::Completed);
    }
}
