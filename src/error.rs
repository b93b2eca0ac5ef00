//! Top-level error taxonomy.
//!
//! Lower layers keep their own `thiserror` enums; the engine converts them
//! into `BotError` at the point where a user-visible outcome is decided.
//! `user_message()` is what the user sees; `Display` is what gets logged.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DatabaseError;
use crate::dialog::validation::ValidationError;
use crate::report::ReportError;
use crate::transport::DeliveryError;
use crate::triage::AiError;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("AI provider error: {0}")]
    Provider(#[from] AiError),

    #[error("Persistence error: {0}")]
    Persistence(DatabaseError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Report error: {0}")]
    Report(ReportError),
}

impl From<DatabaseError> for BotError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                BotError::NotFound(format!("{entity_type} {id}"))
            }
            other => BotError::Persistence(other),
        }
    }
}

impl From<ReportError> for BotError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::InsufficientData => BotError::NotFound("report history".into()),
            other => BotError::Report(other),
        }
    }
}

impl BotError {
    /// Generic user-facing text. Detail stays in the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            BotError::Validation(_) => "⚠️ Некоректне значення. Спробуйте ще раз.",
            BotError::NotFound(_) => "Дані не знайдено. Заповніть профіль або зробіть запис через меню.",
            BotError::Provider(_) => {
                "😔 Вибачте, сервіс аналізу симптомів зараз недоступний. Спробуйте пізніше."
            }
            BotError::Persistence(_) => "😔 Сталася внутрішня помилка. Спробуйте ще раз пізніше.",
            BotError::Delivery(_) => "😔 Не вдалося надіслати повідомлення.",
            BotError::Report(_) => "😔 Не вдалося створити звіт. Спробуйте пізніше.",
        }
    }

    /// Errors the user can fix on their own; logged at warn instead of error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BotError::Validation(_) | BotError::NotFound(_) | BotError::Provider(_))
    }
}

/// Failures that stop the process before the dispatcher runs.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("AI client error: {0}")]
    Provider(#[from] AiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
