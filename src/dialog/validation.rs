//! Field-level validation of free-text answers.
//!
//! Every validator either returns the value to store or a
//! `ValidationError`; the caller re-prompts in the same state on error.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;
use thiserror::Error;

use crate::models::{ProfileField, ProfileValue};

pub const GENDER_MALE: &str = "Чоловіча";
pub const GENDER_FEMALE: &str = "Жіноча";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("empty input")]
    Empty,

    #[error("not a number: {0}")]
    NotANumber(String),

    #[error("negative value: {0}")]
    Negative(String),

    #[error("unknown gender token: {0}")]
    UnknownGender(String),

    #[error("malformed schedule: {0}")]
    MalformedSchedule(String),
}

impl ValidationError {
    /// Short hint shown above the repeated question.
    pub fn hint(&self) -> &'static str {
        match self {
            ValidationError::Empty => "Відповідь не може бути порожньою.",
            ValidationError::NotANumber(_) => "Будь ласка, введіть число.",
            ValidationError::Negative(_) => "Значення не може бути від'ємним.",
            ValidationError::UnknownGender(_) => "Оберіть «Чоловіча» або «Жіноча».",
            ValidationError::MalformedSchedule(_) => {
                "Неправильний формат часу. Приклад: 09:00, 21:00"
            }
        }
    }
}

static SCHEDULE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}:\d{2}(\s*,\s*\d{2}:\d{2})*$").unwrap()
});

static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2}:\d{2}").unwrap());

pub fn non_empty(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(trimmed.to_string())
}

pub fn parse_non_negative_int(text: &str) -> Result<i64, ValidationError> {
    let trimmed = non_empty(text)?;
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber(trimmed.clone()))?;
    if value < 0 {
        return Err(ValidationError::Negative(trimmed));
    }
    Ok(value)
}

/// Accepts both "61.5" and "61,5".
pub fn parse_non_negative_real(text: &str) -> Result<f64, ValidationError> {
    let trimmed = non_empty(text)?;
    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| ValidationError::NotANumber(trimmed.clone()))?;
    if !value.is_finite() {
        return Err(ValidationError::NotANumber(trimmed));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative(trimmed));
    }
    Ok(value)
}

/// Case-insensitive match against the two accepted tokens; returns the canonical one.
pub fn parse_gender(text: &str) -> Result<String, ValidationError> {
    let trimmed = non_empty(text)?;
    let lowered = trimmed.to_lowercase();
    [GENDER_MALE, GENDER_FEMALE]
        .into_iter()
        .find(|token| token.to_lowercase() == lowered)
        .map(str::to_string)
        .ok_or(ValidationError::UnknownGender(trimmed))
}

/// Validates a comma-separated `HH:MM` list and normalises it to "HH:MM, HH:MM".
pub fn validate_schedule(text: &str) -> Result<String, ValidationError> {
    let trimmed = non_empty(text)?;
    if !SCHEDULE_PATTERN.is_match(&trimmed) {
        return Err(ValidationError::MalformedSchedule(trimmed));
    }
    let mut times = Vec::new();
    for token in trimmed.split(',').map(str::trim) {
        let time = NaiveTime::parse_from_str(token, "%H:%M")
            .map_err(|_| ValidationError::MalformedSchedule(trimmed.clone()))?;
        times.push(time.format("%H:%M").to_string());
    }
    Ok(times.join(", "))
}

/// Extracts every valid `HH:MM` token from a stored schedule string.
///
/// Out-of-range tokens ("25:00") are skipped rather than failing the whole
/// schedule; duplicates collapse to one trigger.
pub fn schedule_times(schedule: &str) -> Vec<NaiveTime> {
    let mut times: Vec<NaiveTime> = TIME_TOKEN
        .find_iter(schedule)
        .filter_map(|m| NaiveTime::parse_from_str(m.as_str(), "%H:%M").ok())
        .collect();
    times.sort();
    times.dedup();
    times
}

/// Validates a profile-edit answer for the given column.
pub fn validate_profile_value(field: ProfileField, text: &str) -> Result<ProfileValue, ValidationError> {
    match field {
        ProfileField::Age => parse_non_negative_int(text).map(ProfileValue::Integer),
        ProfileField::WeightKg | ProfileField::HeightCm => {
            parse_non_negative_real(text).map(ProfileValue::Real)
        }
        ProfileField::Gender => parse_gender(text).map(ProfileValue::Text),
        ProfileField::BloodGroup
        | ProfileField::Allergies
        | ProfileField::ChronicDiseases
        | ProfileField::EmergencyContact => non_empty(text).map(ProfileValue::Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        assert_eq!(parse_non_negative_int(" 34 "), Ok(34));
        assert_eq!(parse_non_negative_int("0"), Ok(0));
        assert!(matches!(parse_non_negative_int("-1"), Err(ValidationError::Negative(_))));
        assert!(matches!(parse_non_negative_int("abc"), Err(ValidationError::NotANumber(_))));
        assert!(matches!(parse_non_negative_int("34.5"), Err(ValidationError::NotANumber(_))));
        assert_eq!(parse_non_negative_int(""), Err(ValidationError::Empty));
    }

    #[test]
    fn reals_accept_decimal_comma() {
        assert_eq!(parse_non_negative_real("61,5"), Ok(61.5));
        assert_eq!(parse_non_negative_real("170"), Ok(170.0));
        assert!(matches!(parse_non_negative_real("-3"), Err(ValidationError::Negative(_))));
        assert!(matches!(parse_non_negative_real("NaN"), Err(ValidationError::NotANumber(_))));
        assert!(matches!(parse_non_negative_real("inf"), Err(ValidationError::NotANumber(_))));
    }

    #[test]
    fn gender_is_case_insensitive_and_canonical() {
        assert_eq!(parse_gender("жіноча").unwrap(), GENDER_FEMALE);
        assert_eq!(parse_gender("ЧОЛОВІЧА").unwrap(), GENDER_MALE);
        assert!(matches!(parse_gender("інша"), Err(ValidationError::UnknownGender(_))));
    }

    #[test]
    fn schedule_normalised() {
        assert_eq!(validate_schedule("09:00,21:00").unwrap(), "09:00, 21:00");
        assert_eq!(validate_schedule(" 08:30 ").unwrap(), "08:30");
    }

    #[test]
    fn schedule_rejections() {
        for bad in ["9:00", "09:00;21:00", "morning", "09:00,", "25:00", "12:60", ""] {
            assert!(validate_schedule(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn schedule_times_extracts_tokens() {
        let times = schedule_times("21:00, 09:00, 09:00");
        assert_eq!(
            times,
            vec![
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            ]
        );
        assert_eq!(schedule_times("25:00, 07:15").len(), 1);
        assert!(schedule_times("").is_empty());
    }

    #[test]
    fn profile_values_by_field() {
        assert_eq!(
            validate_profile_value(ProfileField::Age, "40"),
            Ok(ProfileValue::Integer(40))
        );
        assert_eq!(
            validate_profile_value(ProfileField::HeightCm, "172,5"),
            Ok(ProfileValue::Real(172.5))
        );
        assert_eq!(
            validate_profile_value(ProfileField::BloodGroup, " A(II) Rh+ "),
            Ok(ProfileValue::Text("A(II) Rh+".into()))
        );
        assert!(validate_profile_value(ProfileField::WeightKg, "багато").is_err());
    }
}
