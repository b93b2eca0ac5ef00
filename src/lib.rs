pub mod config;
pub mod core_state;
pub mod db;
pub mod dialog;
pub mod error;
pub mod insights;
pub mod messages;
pub mod models;
pub mod recommendation;
pub mod report;
pub mod scheduler;
pub mod transport;
pub mod triage;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use teloxide::Bot;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::CoreState;
use crate::error::StartupError;
use crate::transport::telegram::{self, TelegramTransport};
use crate::triage::OpenRouterClient;

/// Boots the bot: logging, config, storage, AI client, scheduler, then the
/// Telegram dispatcher until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cfg = AppConfig::from_env()?;
    tracing::info!(config = ?cfg, "Configuration loaded");

    std::fs::create_dir_all(cfg.reports_dir())?;
    // Migrate once up front so the first user event does not pay for it.
    db::open_database(&cfg.database_path())?;

    let ai = Arc::new(OpenRouterClient::new(
        &cfg.ai_base_url,
        &cfg.ai_model,
        cfg.ai_api_key.clone(),
        cfg.ai_timeout,
    )?);
    let bot = Bot::new(cfg.bot_token.as_str());
    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    let core = Arc::new(CoreState::from_config(&cfg, ai, transport));
    if core.report_font.is_none() {
        tracing::warn!(
            "No report font found (set {}); PDF text will be transliterated",
            report::FONT_ENV
        );
    }

    let scheduler = scheduler::start_scheduler(Arc::clone(&core));
    telegram::run_dispatcher(core, bot).await;

    scheduler.abort();
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
