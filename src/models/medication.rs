use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::MedicationLogStatus;
use super::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub med_id: i64,
    pub user_id: UserId,
    pub name: String,
    pub dosage: String,
    /// Comma-separated `HH:MM` trigger points, e.g. "09:00, 21:00".
    pub schedule: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub schedule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationLogEntry {
    pub log_id: i64,
    pub med_id: i64,
    pub user_id: UserId,
    pub timestamp: NaiveDateTime,
    pub status: MedicationLogStatus,
}
