use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::UserId;

/// Append-only journal row: either a full check-in or a quick note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEntry {
    pub entry_id: i64,
    pub user_id: UserId,
    pub timestamp: NaiveDateTime,
    pub mood: Option<String>,
    pub sleep_quality: Option<String>,
    pub note: Option<String>,
    pub activity_level: Option<String>,
    pub stress_level: Option<String>,
    pub water_intake: Option<String>,
}

impl HealthEntry {
    pub fn is_checkin(&self) -> bool {
        self.mood.is_some()
            && self.sleep_quality.is_some()
            && self.activity_level.is_some()
            && self.stress_level.is_some()
            && self.water_intake.is_some()
    }
}

/// The five answers of a completed daily check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinAnswers {
    pub mood: String,
    pub sleep_quality: String,
    pub activity_level: String,
    pub stress_level: String,
    pub water_intake: String,
}

/// Sparse field set for a new journal row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthEntryDraft {
    pub mood: Option<String>,
    pub sleep_quality: Option<String>,
    pub note: Option<String>,
    pub activity_level: Option<String>,
    pub stress_level: Option<String>,
    pub water_intake: Option<String>,
}

impl HealthEntryDraft {
    pub fn note(text: &str) -> Self {
        Self {
            note: Some(text.to_string()),
            ..Self::default()
        }
    }

    /// True when no field carries non-blank text.
    pub fn is_empty(&self) -> bool {
        [
            &self.mood,
            &self.sleep_quality,
            &self.note,
            &self.activity_level,
            &self.stress_level,
            &self.water_intake,
        ]
        .iter()
        .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

impl From<&CheckinAnswers> for HealthEntryDraft {
    fn from(a: &CheckinAnswers) -> Self {
        Self {
            mood: Some(a.mood.clone()),
            sleep_quality: Some(a.sleep_quality.clone()),
            note: None,
            activity_level: Some(a.activity_level.clone()),
            stress_level: Some(a.stress_level.clone()),
            water_intake: Some(a.water_intake.clone()),
        }
    }
}
