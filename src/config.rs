use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use thiserror::Error;
use zeroize::Zeroizing;

/// Application-level constants
pub const APP_NAME: &str = "Med Pomichnyk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DATABASE_FILE: &str = "health_log.db";
pub const REPORTS_DIR: &str = "reports";

pub const PRIVACY_POLICY_URL: &str = "https://telegra.ph/Pol%D1%96tika-konf%D1%96denc%D1%96jnost%D1%96-dlya-medichnogo-pom%D1%96chnika-med-pomichnyk-bot-07-22-2";

/// How often the scheduler wakes to look for due triggers.
pub const SCHEDULER_TICK: Duration = Duration::from_secs(60);

/// Weekly summary slot: Sunday 10:00 local time.
pub const WEEKLY_REPORT_DAY: Weekday = Weekday::Sun;
pub const WEEKLY_REPORT_TIME: (u32, u32) = (10, 0);

/// Responses shorter than this that contain '?' count as a clarifying question.
pub const CLARIFICATION_MAX_LEN: usize = 300;
/// Clarification rounds before the answer is taken as final.
pub const MAX_CLARIFICATION_ROUNDS: u8 = 3;

/// Entries shown in the history view and the doctor report.
pub const HISTORY_LIMIT: u32 = 15;

pub const DEFAULT_AI_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_AI_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;

const DATA_DIR_ENV: &str = "MED_POMICHNYK_DATA_DIR";

pub fn default_log_filter() -> &'static str {
    "med_pomichnyk=info,teloxide=warn"
}

pub fn weekly_report_time() -> NaiveTime {
    let (h, m) = WEEKLY_REPORT_TIME;
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Runtime configuration, read once at startup.
pub struct AppConfig {
    pub bot_token: Zeroizing<String>,
    pub ai_api_key: Zeroizing<String>,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_timeout: Duration,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .map(Zeroizing::new)
                .ok_or(ConfigError::MissingVar(var))
        };

        let bot_token = required("BOT_TOKEN")?;
        let ai_api_key = required("OPENROUTER_API_KEY")?;

        let ai_timeout_secs = match lookup("AI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                ConfigError::InvalidValue {
                    var: "AI_TIMEOUT_SECS",
                    reason: format!("expected a positive number of seconds, got {raw:?}"),
                }
            })?,
            None => DEFAULT_AI_TIMEOUT_SECS,
        };

        let data_dir = match lookup(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Self {
            bot_token,
            ai_api_key,
            ai_base_url: lookup("AI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            ai_model: lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            data_dir,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join(REPORTS_DIR)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("ai_base_url", &self.ai_base_url)
            .field("ai_model", &self.ai_model)
            .field("ai_timeout", &self.ai_timeout)
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

/// ~/MedPomichnyk/ unless overridden.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::InvalidValue {
        var: DATA_DIR_ENV,
        reason: "cannot determine home directory".into(),
    })?;
    Ok(home.join("MedPomichnyk"))
}
