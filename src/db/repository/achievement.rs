use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{Achievement, AchievementCode, UserId};

pub fn get_achievement(
    conn: &Connection,
    code: AchievementCode,
) -> Result<Option<Achievement>, DatabaseError> {
    let achievement = conn
        .query_row(
            "SELECT code, name, description, icon FROM achievements WHERE code = ?1",
            params![code.as_str()],
            |row| {
                Ok(Achievement {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    icon: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(achievement)
}

pub fn has_achievement(
    conn: &Connection,
    user_id: UserId,
    code: AchievementCode,
) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM user_achievements WHERE user_id = ?1 AND achievement_code = ?2)",
        params![user_id, code.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Awards an achievement once. Returns it only on the first award.
pub fn grant_achievement(
    conn: &Connection,
    user_id: UserId,
    code: AchievementCode,
) -> Result<Option<Achievement>, DatabaseError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_achievements (user_id, achievement_code) VALUES (?1, ?2)",
        params![user_id, code.as_str()],
    )?;
    if inserted == 0 {
        return Ok(None);
    }
    get_achievement(conn, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;

    #[test]
    fn catalog_entries_are_seeded() {
        let conn = test_db();
        let a = get_achievement(&conn, AchievementCode::FirstReport).unwrap().unwrap();
        assert_eq!(a.code, "FIRST_REPORT");
        assert_eq!(a.icon, "📄");
    }

    #[test]
    fn grant_is_idempotent() {
        let conn = test_db();
        seed_user(&conn, 1);
        assert!(!has_achievement(&conn, 1, AchievementCode::FirstNote).unwrap());

        let first = grant_achievement(&conn, 1, AchievementCode::FirstNote).unwrap();
        assert_eq!(first.map(|a| a.code), Some("FIRST_NOTE".to_string()));
        assert!(grant_achievement(&conn, 1, AchievementCode::FirstNote).unwrap().is_none());
        assert!(has_achievement(&conn, 1, AchievementCode::FirstNote).unwrap());

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_achievements", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn achievements_are_per_user() {
        let conn = test_db();
        seed_user(&conn, 1);
        seed_user(&conn, 2);
        grant_achievement(&conn, 1, AchievementCode::Streak5Days).unwrap();
        assert!(!has_achievement(&conn, 2, AchievementCode::Streak5Days).unwrap());
        assert!(grant_achievement(&conn, 2, AchievementCode::Streak5Days).unwrap().is_some());
    }
}
