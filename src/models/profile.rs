use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub first_name: String,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
    pub emergency_contact: Option<String>,
    pub checkin_streak: u32,
    pub last_checkin_date: Option<NaiveDate>,
}

impl UserProfile {
    /// Women's-health menu is offered only to users who chose the female token.
    pub fn is_female(&self) -> bool {
        self.gender
            .as_deref()
            .map(|g| g.to_lowercase() == "жіноча")
            .unwrap_or(false)
    }

    /// True when at least one emergency-card field is filled in.
    pub fn has_medical_context(&self) -> bool {
        self.allergies.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.chronic_diseases.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// A validated value for one editable profile column.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ToSql for ProfileValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Integer(v) => v.to_sql(),
            Self::Real(v) => v.to_sql(),
            Self::Text(v) => v.to_sql(),
        }
    }
}

impl std::fmt::Display for ProfileValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}
