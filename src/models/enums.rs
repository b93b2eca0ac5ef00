use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MedicationLogStatus {
    Taken => "taken",
    Skipped => "skipped",
});

// Values double as `users` column names; keep them in sync with the schema.
str_enum!(ProfileField {
    Age => "age",
    Gender => "gender",
    WeightKg => "weight_kg",
    HeightCm => "height_cm",
    BloodGroup => "blood_group",
    Allergies => "allergies",
    ChronicDiseases => "chronic_diseases",
    EmergencyContact => "emergency_contact",
});

str_enum!(AchievementCode {
    FirstReport => "FIRST_REPORT",
    Streak5Days => "STREAK_5_DAYS",
    FirstNote => "FIRST_NOTE",
});

impl ProfileField {
    pub const ALL: [ProfileField; 8] = [
        ProfileField::Age,
        ProfileField::Gender,
        ProfileField::WeightKg,
        ProfileField::HeightCm,
        ProfileField::BloodGroup,
        ProfileField::Allergies,
        ProfileField::ChronicDiseases,
        ProfileField::EmergencyContact,
    ];

    /// Human-readable label shown on buttons and in the profile card.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Age => "Вік",
            Self::Gender => "Стать",
            Self::WeightKg => "Вага (кг)",
            Self::HeightCm => "Зріст (см)",
            Self::BloodGroup => "Група крові",
            Self::Allergies => "Алергії",
            Self::ChronicDiseases => "Хронічні захворювання",
            Self::EmergencyContact => "Екстрений контакт",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn medication_log_status_round_trip() {
        for (variant, s) in [
            (MedicationLogStatus::Taken, "taken"),
            (MedicationLogStatus::Skipped, "skipped"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(MedicationLogStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn profile_field_round_trip() {
        for field in ProfileField::ALL {
            assert_eq!(ProfileField::from_str(field.as_str()).unwrap(), field);
        }
    }

    #[test]
    fn achievement_codes_match_catalog() {
        assert_eq!(AchievementCode::Streak5Days.as_str(), "STREAK_5_DAYS");
        assert_eq!(AchievementCode::from_str("FIRST_NOTE").unwrap(), AchievementCode::FirstNote);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(MedicationLogStatus::from_str("maybe").is_err());
        assert!(ProfileField::from_str("first_name").is_err());
        assert!(AchievementCode::from_str("").is_err());
    }
}
