//! Repository layer — entity-scoped database operations.
//!
//! Every function takes a borrowed `Connection`; callers open one
//! connection per logical operation. Multi-statement operations that must
//! stay consistent (`complete_checkin`, `start_cycle`) take `&mut
//! Connection` and run inside a transaction.

mod achievement;
mod ai_interaction;
mod cycle;
mod health_entry;
mod medication;
mod user;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;

use super::{DATE_FORMAT, TIMESTAMP_FORMAT};

pub use achievement::*;
pub use ai_interaction::*;
pub use cycle::*;
pub use health_entry::*;
pub use medication::*;
pub use user::*;

pub(crate) fn date_from_sql(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn timestamp_from_sql(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
