use crate::models::ProfileField;

/// Per-user dialog position plus the answers gathered so far.
///
/// Each variant names the input it is waiting for and carries exactly the
/// scratch data collected on the way there. Entering a dialog builds a fresh
/// variant, so nothing leaks between dialogs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DialogState {
    #[default]
    Idle,

    CheckinMood,
    CheckinSleep {
        mood: String,
    },
    CheckinActivity {
        mood: String,
        sleep: String,
    },
    CheckinStress {
        mood: String,
        sleep: String,
        activity: String,
    },
    CheckinWater {
        mood: String,
        sleep: String,
        activity: String,
        stress: String,
    },

    WaitingForNote,

    EditField(ProfileField),

    AddMedName,
    AddMedDosage {
        name: String,
    },
    AddMedSchedule {
        name: String,
        dosage: String,
    },

    /// Symptom menu shown; free text here is delegated as-is.
    SymptomCheckerStart,
    HeadacheType,
    HeadacheLocation {
        kind: String,
    },
    HeadacheAdditional {
        kind: String,
        location: String,
    },

    /// The AI asked a follow-up. `symptoms` is everything said so far.
    AwaitingClarification {
        symptoms: String,
        round: u8,
    },
}

impl DialogState {
    /// Stable tag for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckinMood => "checkin_mood",
            Self::CheckinSleep { .. } => "checkin_sleep",
            Self::CheckinActivity { .. } => "checkin_activity",
            Self::CheckinStress { .. } => "checkin_stress",
            Self::CheckinWater { .. } => "checkin_water",
            Self::WaitingForNote => "waiting_for_note",
            Self::EditField(ProfileField::Age) => "edit_age",
            Self::EditField(ProfileField::Gender) => "edit_gender",
            Self::EditField(ProfileField::WeightKg) => "edit_weight_kg",
            Self::EditField(ProfileField::HeightCm) => "edit_height_cm",
            Self::EditField(ProfileField::BloodGroup) => "edit_blood_group",
            Self::EditField(ProfileField::Allergies) => "edit_allergies",
            Self::EditField(ProfileField::ChronicDiseases) => "edit_chronic_diseases",
            Self::EditField(ProfileField::EmergencyContact) => "edit_emergency_contact",
            Self::AddMedName => "add_med_name",
            Self::AddMedDosage { .. } => "add_med_dosage",
            Self::AddMedSchedule { .. } => "add_med_schedule",
            Self::SymptomCheckerStart => "symptom_checker_start",
            Self::HeadacheType => "headache_type",
            Self::HeadacheLocation { .. } => "headache_location",
            Self::HeadacheAdditional { .. } => "headache_additional",
            Self::AwaitingClarification { .. } => "awaiting_clarification",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
