use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{format_timestamp, timestamp_from_sql};
use crate::db::DatabaseError;
use crate::models::UserId;

/// One prompt/response exchange with the AI provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiInteraction {
    pub id: i64,
    pub user_id: UserId,
    pub timestamp: NaiveDateTime,
    pub prompt: String,
    pub response: String,
}

pub fn log_ai_interaction(
    conn: &Connection,
    user_id: UserId,
    prompt: &str,
    response: &str,
    at: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO ai_interactions (user_id, timestamp, prompt, response)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, format_timestamp(&at), prompt, response],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Exchanges of one user, oldest first.
pub fn get_ai_interactions(
    conn: &Connection,
    user_id: UserId,
) -> Result<Vec<AiInteraction>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, timestamp, prompt, response FROM ai_interactions
         WHERE user_id = ?1 ORDER BY id"
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        let ts: String = row.get(2)?;
        Ok(AiInteraction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            timestamp: timestamp_from_sql(2, &ts)?,
            prompt: row.get(3)?,
            response: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;

    #[test]
    fn interactions_are_appended_in_order() {
        let conn = test_db();
        seed_user(&conn, 1);
        let t = NaiveDateTime::parse_from_str("2026-03-10 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        log_ai_interaction(&conn, 1, "головний біль", "Скільки триває біль?", t).unwrap();
        log_ai_interaction(&conn, 1, "2 дні", "Рекомендації...", t).unwrap();

        let log = get_ai_interactions(&conn, 1).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].prompt, "головний біль");
        assert_eq!(log[1].response, "Рекомендації...");
        assert_eq!(log[0].timestamp, t);
    }
}
