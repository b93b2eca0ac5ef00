use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{date_from_sql, format_date};
use crate::db::DatabaseError;
use crate::models::{Cycle, UserId};

pub fn get_open_cycle(conn: &Connection, user_id: UserId) -> Result<Option<Cycle>, DatabaseError> {
    let cycle = conn
        .query_row(
            "SELECT cycle_id, user_id, start_date, end_date FROM cycles
             WHERE user_id = ?1 AND end_date IS NULL",
            params![user_id],
            cycle_from_row,
        )
        .optional()?;
    Ok(cycle)
}

/// Opens a cycle on `today`, closing any open one on the previous day.
///
/// Returns `false` without writing when the open cycle already starts on
/// or after `today`.
pub fn start_cycle(
    conn: &mut Connection,
    user_id: UserId,
    today: NaiveDate,
) -> Result<bool, DatabaseError> {
    let tx = conn.transaction()?;

    if let Some(open) = get_open_cycle(&tx, user_id)? {
        if open.start_date >= today {
            return Ok(false);
        }
        let close_on = today - Duration::days(1);
        tx.execute(
            "UPDATE cycles SET end_date = ?1 WHERE cycle_id = ?2",
            params![format_date(&close_on), open.cycle_id],
        )?;
    }

    tx.execute(
        "INSERT INTO cycles (user_id, start_date) VALUES (?1, ?2)",
        params![user_id, format_date(&today)],
    )?;
    tx.commit()?;
    Ok(true)
}

/// Closes the open cycle on `today`. Returns `false` if none was open.
pub fn end_cycle(conn: &Connection, user_id: UserId, today: NaiveDate) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE cycles SET end_date = ?1 WHERE user_id = ?2 AND end_date IS NULL",
        params![format_date(&today), user_id],
    )?;
    Ok(updated > 0)
}

/// Closed cycles, most recent start first.
pub fn get_closed_cycles(
    conn: &Connection,
    user_id: UserId,
    limit: u32,
) -> Result<Vec<Cycle>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT cycle_id, user_id, start_date, end_date FROM cycles
         WHERE user_id = ?1 AND end_date IS NOT NULL
         ORDER BY start_date DESC
         LIMIT ?2"
    )?;
    let rows = stmt.query_map(params![user_id, limit], cycle_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn cycle_from_row(row: &Row<'_>) -> rusqlite::Result<Cycle> {
    let start: String = row.get(2)?;
    let end: Option<String> = row.get(3)?;
    Ok(Cycle {
        cycle_id: row.get(0)?,
        user_id: row.get(1)?,
        start_date: date_from_sql(2, &start)?,
        end_date: end.as_deref().map(|s| date_from_sql(3, s)).transpose()?,
    })
}
