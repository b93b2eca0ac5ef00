use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{date_from_sql, format_date, format_timestamp, timestamp_from_sql};
use crate::db::DatabaseError;
use crate::models::{CheckinAnswers, HealthEntry, HealthEntryDraft, UserId};

/// Result of committing a daily check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckinOutcome {
    pub entry_id: i64,
    pub streak: u32,
}

/// Streak after a check-in on `today`.
///
/// Consecutive day increments, a gap resets to 1, a repeat on the same
/// calendar day leaves the streak unchanged.
pub fn next_streak(current: u32, last: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(last) = last else {
        return 1;
    };
    match (today - last).num_days() {
        1 => current.saturating_add(1),
        d if d > 1 => 1,
        // Same day, or a clock that moved backwards.
        _ => current.max(1),
    }
}

/// Appends a sparse journal row. Rejects drafts with no non-blank field.
pub fn append_health_entry(
    conn: &Connection,
    user_id: UserId,
    draft: &HealthEntryDraft,
    captured_at: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    if draft.is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "Health entry needs at least one non-empty field".into(),
        ));
    }
    conn.execute(
        "INSERT INTO health_entries (user_id, timestamp, mood, sleep_quality, note,
                                     activity_level, stress_level, water_intake)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user_id,
            format_timestamp(&captured_at),
            draft.mood,
            draft.sleep_quality,
            draft.note,
            draft.activity_level,
            draft.stress_level,
            draft.water_intake,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Stores a quick note.
pub fn record_note(
    conn: &Connection,
    user_id: UserId,
    text: &str,
    captured_at: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    append_health_entry(conn, user_id, &HealthEntryDraft::note(text.trim()), captured_at)
}

/// Inserts the check-in and updates the streak in one transaction.
pub fn complete_checkin(
    conn: &mut Connection,
    user_id: UserId,
    answers: &CheckinAnswers,
    captured_at: NaiveDateTime,
) -> Result<CheckinOutcome, DatabaseError> {
    let today = captured_at.date();
    let tx = conn.transaction()?;

    let entry_id = append_health_entry(&tx, user_id, &HealthEntryDraft::from(answers), captured_at)?;

    let (current, last_raw): (i64, Option<String>) = tx
        .query_row(
            "SELECT checkin_streak, last_checkin_date FROM users WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user_id.to_string(),
        })?;
    let last = last_raw.as_deref().map(|s| date_from_sql(1, s)).transpose()?;

    let streak = next_streak(current.max(0) as u32, last, today);
    tx.execute(
        "UPDATE users SET checkin_streak = ?1, last_checkin_date = ?2 WHERE user_id = ?3",
        params![streak, format_date(&today), user_id],
    )?;

    tx.commit()?;
    Ok(CheckinOutcome { entry_id, streak })
}

/// Most recent entries first.
pub fn get_user_history(
    conn: &Connection,
    user_id: UserId,
    limit: u32,
) -> Result<Vec<HealthEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT entry_id, user_id, timestamp, mood, sleep_quality, note,
                activity_level, stress_level, water_intake
         FROM health_entries
         WHERE user_id = ?1
         ORDER BY timestamp DESC, entry_id DESC
         LIMIT ?2"
    )?;
    let rows = stmt.query_map(params![user_id, limit], entry_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Entries captured at or after `since`, oldest first.
pub fn get_entries_since(
    conn: &Connection,
    user_id: UserId,
    since: NaiveDateTime,
) -> Result<Vec<HealthEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT entry_id, user_id, timestamp, mood, sleep_quality, note,
                activity_level, stress_level, water_intake
         FROM health_entries
         WHERE user_id = ?1 AND timestamp >= ?2
         ORDER BY timestamp ASC, entry_id ASC"
    )?;
    let rows = stmt.query_map(params![user_id, format_timestamp(&since)], entry_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<HealthEntry> {
    let ts: String = row.get(2)?;
    Ok(HealthEntry {
        entry_id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp: timestamp_from_sql(2, &ts)?,
        mood: row.get(3)?,
        sleep_quality: row.get(4)?,
        note: row.get(5)?,
        activity_level: row.get(6)?,
        stress_level: row.get(7)?,
        water_intake: row.get(8)?,
    })
}
