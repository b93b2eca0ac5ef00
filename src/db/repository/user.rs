use rusqlite::{params, Connection, OptionalExtension, Row};

use super::date_from_sql;
use crate::db::DatabaseError;
use crate::models::{ProfileField, ProfileValue, UserId, UserProfile};

/// Creates the user on first contact; refreshes the display name otherwise.
pub fn ensure_user(conn: &Connection, user_id: UserId, first_name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (user_id, first_name) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET first_name = excluded.first_name",
        params![user_id, first_name],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, user_id: UserId) -> Result<Option<UserProfile>, DatabaseError> {
    let user = conn
        .query_row(
            "SELECT user_id, first_name, age, gender, weight_kg, height_cm, blood_group,
                    allergies, chronic_diseases, emergency_contact, checkin_streak, last_checkin_date
             FROM users WHERE user_id = ?1",
            params![user_id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Writes one whitelisted profile column.
pub fn update_user_field(
    conn: &Connection,
    user_id: UserId,
    field: ProfileField,
    value: &ProfileValue,
) -> Result<(), DatabaseError> {
    // Column name comes from the closed ProfileField enum, never from input.
    let sql = format!("UPDATE users SET {} = ?1 WHERE user_id = ?2", field.as_str());
    let updated = conn.execute(&sql, params![value, user_id])?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user_id.to_string(),
        });
    }
    Ok(())
}

/// Users who should receive the weekly report: anyone with a journal entry.
pub fn list_report_recipients(conn: &Connection) -> Result<Vec<UserId>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT user_id FROM health_entries ORDER BY user_id"
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, UserId>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    let last_checkin: Option<String> = row.get(11)?;
    Ok(UserProfile {
        user_id: row.get(0)?,
        first_name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        weight_kg: row.get(4)?,
        height_cm: row.get(5)?,
        blood_group: row.get(6)?,
        allergies: row.get(7)?,
        chronic_diseases: row.get(8)?,
        emergency_contact: row.get(9)?,
        checkin_streak: row.get::<_, i64>(10)?.max(0) as u32,
        last_checkin_date: last_checkin
            .as_deref()
            .map(|s| date_from_sql(11, s))
            .transpose()?,
    })
}
