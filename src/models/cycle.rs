use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub cycle_id: i64,
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}
