use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, timestamp_from_sql};
use crate::db::DatabaseError;
use crate::models::{Medication, MedicationLogEntry, MedicationLogStatus, NewMedication, UserId};

const MEDICATION_COLUMNS: &str = "med_id, user_id, med_name, dosage, schedule, is_active";

pub fn add_medication(
    conn: &Connection,
    user_id: UserId,
    med: &NewMedication,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medications (user_id, med_name, dosage, schedule, is_active)
         VALUES (?1, ?2, ?3, ?4, 1)",
        params![user_id, med.name, med.dosage, med.schedule],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medication(conn: &Connection, med_id: i64) -> Result<Option<Medication>, DatabaseError> {
    let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE med_id = ?1");
    let med = conn
        .query_row(&sql, params![med_id], medication_from_row)
        .optional()?;
    Ok(med)
}

/// Active medications of one user, in insertion order.
pub fn get_active_medications(
    conn: &Connection,
    user_id: UserId,
) -> Result<Vec<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE user_id = ?1 AND is_active = 1 ORDER BY med_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], medication_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Every active medication across all users. Feeds the reminder registry.
pub fn list_active_medications(conn: &Connection) -> Result<Vec<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications WHERE is_active = 1 ORDER BY med_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], medication_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Soft-deletes a medication owned by `user_id`. History rows stay.
pub fn deactivate_medication(
    conn: &Connection,
    user_id: UserId,
    med_id: i64,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medications SET is_active = 0
         WHERE med_id = ?1 AND user_id = ?2 AND is_active = 1",
        params![med_id, user_id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Medication".into(),
            id: med_id.to_string(),
        });
    }
    Ok(())
}

/// Records a reminder response. The medication must belong to the user.
pub fn log_medication_status(
    conn: &Connection,
    user_id: UserId,
    med_id: i64,
    status: MedicationLogStatus,
    at: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    let owned: Option<i64> = conn
        .query_row(
            "SELECT med_id FROM medications WHERE med_id = ?1 AND user_id = ?2",
            params![med_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    if owned.is_none() {
        return Err(DatabaseError::NotFound {
            entity_type: "Medication".into(),
            id: med_id.to_string(),
        });
    }

    conn.execute(
        "INSERT INTO medication_log (med_id, user_id, timestamp, status)
         VALUES (?1, ?2, ?3, ?4)",
        params![med_id, user_id, format_timestamp(&at), status.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medication_log(
    conn: &Connection,
    user_id: UserId,
    med_id: i64,
) -> Result<Vec<MedicationLogEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT log_id, med_id, user_id, timestamp, status
         FROM medication_log WHERE user_id = ?1 AND med_id = ?2
         ORDER BY timestamp, log_id"
    )?;
    let rows = stmt.query_map(params![user_id, med_id], |row| {
        let ts: String = row.get(3)?;
        let status: String = row.get(4)?;
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, timestamp_from_sql(3, &ts)?, status))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (log_id, med_id, user_id, timestamp, status) = row?;
        entries.push(MedicationLogEntry {
            log_id,
            med_id,
            user_id,
            timestamp,
            status: status.parse()?,
        });
    }
    Ok(entries)
}

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        med_id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        schedule: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;

    fn new_med(name: &str, schedule: &str) -> NewMedication {
        NewMedication {
            name: name.into(),
            dosage: "1 таблетка".into(),
            schedule: schedule.into(),
        }
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn add_and_list_active() {
        let conn = test_db();
        seed_user(&conn, 1);
        let id = add_medication(&conn, 1, &new_med("Аспірин", "09:00, 21:00")).unwrap();

        let meds = get_active_medications(&conn, 1).unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].med_id, id);
        assert_eq!(meds[0].name, "Аспірин");
        assert_eq!(meds[0].schedule, "09:00, 21:00");
        assert!(meds[0].is_active);
    }

    #[test]
    fn deactivate_hides_from_active_lists() {
        let conn = test_db();
        seed_user(&conn, 1);
        let keep = add_medication(&conn, 1, &new_med("A", "08:00")).unwrap();
        let drop = add_medication(&conn, 1, &new_med("B", "10:00")).unwrap();

        deactivate_medication(&conn, 1, drop).unwrap();

        let ids: Vec<_> = list_active_medications(&conn).unwrap().iter().map(|m| m.med_id).collect();
        assert_eq!(ids, vec![keep]);
        let stored = get_medication(&conn, drop).unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[test]
    fn deactivate_foreign_medication_is_not_found() {
        let conn = test_db();
        seed_user(&conn, 1);
        seed_user(&conn, 2);
        let id = add_medication(&conn, 1, &new_med("A", "08:00")).unwrap();
        let result = deactivate_medication(&conn, 2, id);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        assert!(get_medication(&conn, id).unwrap().unwrap().is_active);
    }

    #[test]
    fn log_status_for_owner() {
        let conn = test_db();
        seed_user(&conn, 1);
        let id = add_medication(&conn, 1, &new_med("A", "08:00")).unwrap();
        log_medication_status(&conn, 1, id, MedicationLogStatus::Taken, at("2026-03-10 08:01:00"))
            .unwrap();
        log_medication_status(&conn, 1, id, MedicationLogStatus::Skipped, at("2026-03-11 08:02:00"))
            .unwrap();

        let log = get_medication_log(&conn, 1, id).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].status, MedicationLogStatus::Taken);
        assert_eq!(log[1].status, MedicationLogStatus::Skipped);
    }

    #[test]
    fn log_status_rejects_other_users_medication() {
        let conn = test_db();
        seed_user(&conn, 1);
        seed_user(&conn, 2);
        let id = add_medication(&conn, 1, &new_med("A", "08:00")).unwrap();
        let result =
            log_medication_status(&conn, 2, id, MedicationLogStatus::Taken, at("2026-03-10 08:00:00"));
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        assert!(get_medication_log(&conn, 2, id).unwrap().is_empty());
    }

    #[test]
    fn log_status_for_deactivated_medication_still_allowed() {
        // A reminder may be answered after the medication was removed.
        let conn = test_db();
        seed_user(&conn, 1);
        let id = add_medication(&conn, 1, &new_med("A", "08:00")).unwrap();
        deactivate_medication(&conn, 1, id).unwrap();
        log_medication_status(&conn, 1, id, MedicationLogStatus::Taken, at("2026-03-10 08:00:00"))
            .unwrap();
        assert_eq!(get_medication_log(&conn, 1, id).unwrap().len(), 1);
    }
}
