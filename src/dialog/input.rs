//! Classification of inbound events.
//!
//! Transport hands over raw text or callback data; everything the state
//! machine and the stateless handlers match on is one of these types.

use crate::models::{MedicationLogStatus, ProfileField};

pub const CANCEL_BUTTON: &str = "⬅️ Головне меню";

pub const MENU_SYMPTOMS: &str = "🤔 Проаналізувати симптоми (AI)";
pub const MENU_CHECKIN: &str = "☀️ Щоденний Check-in";
pub const MENU_NOTE: &str = "📝 Швидкий запис";
pub const MENU_PROFILE: &str = "👤 Мій профіль";
pub const MENU_MEDICATIONS: &str = "💊 Мої ліки";
pub const MENU_HISTORY: &str = "📖 Переглянути історію";
pub const MENU_REPORT: &str = "📄 Створити звіт";
pub const MENU_WOMENS_HEALTH: &str = "🌸 Жіноче здоров'я";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Universal "back to main menu".
    Cancel,
    Command(Command),
    Menu(MenuAction),
    Callback(CallbackAction),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Sos,
    Privacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SymptomChecker,
    Checkin,
    QuickNote,
    Profile,
    Medications,
    History,
    Report,
    WomensHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymptomChoice {
    Headache,
    SoreThroat,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    Start,
    End,
    Predict,
}

/// Inline-button payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Privacy { accepted: bool },
    EditProfile(ProfileField),
    AddMedication,
    DeactivateMedication(i64),
    MedicationLog { med_id: i64, status: MedicationLogStatus },
    Symptom(SymptomChoice),
    Cycle(CycleAction),
}

impl Input {
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed == CANCEL_BUTTON || trimmed == "/cancel" {
            return Input::Cancel;
        }
        if let Some(command) = Command::parse(trimmed) {
            return Input::Command(command);
        }
        if let Some(action) = MenuAction::parse(trimmed) {
            return Input::Menu(action);
        }
        Input::Text(trimmed.to_string())
    }

    /// Unknown callback payloads yield `None` and are ignored.
    pub fn from_callback(data: &str) -> Option<Self> {
        CallbackAction::decode(data).map(Input::Callback)
    }
}

impl Command {
    fn parse(text: &str) -> Option<Self> {
        // "/start@MyBot payload" in groups; only the command word matters.
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" => Some(Command::Start),
            "sos" => Some(Command::Sos),
            "privacy" => Some(Command::Privacy),
            _ => None,
        }
    }
}

impl MenuAction {
    pub const ALL: [MenuAction; 8] = [
        MenuAction::SymptomChecker,
        MenuAction::Checkin,
        MenuAction::QuickNote,
        MenuAction::Profile,
        MenuAction::Medications,
        MenuAction::History,
        MenuAction::Report,
        MenuAction::WomensHealth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::SymptomChecker => MENU_SYMPTOMS,
            MenuAction::Checkin => MENU_CHECKIN,
            MenuAction::QuickNote => MENU_NOTE,
            MenuAction::Profile => MENU_PROFILE,
            MenuAction::Medications => MENU_MEDICATIONS,
            MenuAction::History => MENU_HISTORY,
            MenuAction::Report => MENU_REPORT,
            MenuAction::WomensHealth => MENU_WOMENS_HEALTH,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.label() == text)
    }
}

impl SymptomChoice {
    fn as_str(&self) -> &'static str {
        match self {
            SymptomChoice::Headache => "headache",
            SymptomChoice::SoreThroat => "sore_throat",
            SymptomChoice::Other => "other",
        }
    }
}

impl CycleAction {
    fn as_str(&self) -> &'static str {
        match self {
            CycleAction::Start => "start",
            CycleAction::End => "end",
            CycleAction::Predict => "predict",
        }
    }
}

impl CallbackAction {
    /// Wire form carried in the button's callback data (max 64 bytes).
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Privacy { accepted: true } => "accept_privacy".into(),
            CallbackAction::Privacy { accepted: false } => "skip_privacy".into(),
            CallbackAction::EditProfile(field) => format!("edit_profile:{}", field.as_str()),
            CallbackAction::AddMedication => "add_med".into(),
            CallbackAction::DeactivateMedication(id) => format!("deactivate_med:{id}"),
            CallbackAction::MedicationLog { med_id, status } => {
                format!("med_log:{}:{med_id}", status.as_str())
            }
            CallbackAction::Symptom(choice) => format!("symptom:{}", choice.as_str()),
            CallbackAction::Cycle(action) => format!("cycle:{}", action.as_str()),
        }
    }

    pub fn decode(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        let prefix = parts.next()?;
        let first = parts.next();
        let second = parts.next();

        match (prefix, first, second) {
            ("accept_privacy", None, None) => Some(CallbackAction::Privacy { accepted: true }),
            ("skip_privacy", None, None) => Some(CallbackAction::Privacy { accepted: false }),
            ("add_med", None, None) => Some(CallbackAction::AddMedication),
            ("edit_profile", Some(field), None) => {
                field.parse().ok().map(CallbackAction::EditProfile)
            }
            ("deactivate_med", Some(id), None) => {
                id.parse().ok().map(CallbackAction::DeactivateMedication)
            }
            ("med_log", Some(status), Some(id)) => Some(CallbackAction::MedicationLog {
                med_id: id.parse().ok()?,
                status: status.parse().ok()?,
            }),
            ("symptom", Some(choice), None) => match choice {
                "headache" => Some(CallbackAction::Symptom(SymptomChoice::Headache)),
                "sore_throat" => Some(CallbackAction::Symptom(SymptomChoice::SoreThroat)),
                "other" => Some(CallbackAction::Symptom(SymptomChoice::Other)),
                _ => None,
            },
            ("cycle", Some(action), None) => match action {
                "start" => Some(CallbackAction::Cycle(CycleAction::Start)),
                "end" => Some(CallbackAction::Cycle(CycleAction::End)),
                "predict" => Some(CallbackAction::Cycle(CycleAction::Predict)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Callbacks that act on stored data without touching dialog state.
    pub fn is_stateless(&self) -> bool {
        matches!(
            self,
            CallbackAction::Privacy { .. }
                | CallbackAction::DeactivateMedication(_)
                | CallbackAction::MedicationLog { .. }
                | CallbackAction::Cycle(_)
        )
    }
}
