//! Transport-agnostic application state.
//!
//! `CoreState` is created once at startup, wrapped in `Arc` and shared by
//! the update dispatcher and the scheduler task. It owns no connection:
//! every logical operation opens its own short-lived SQLite connection.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use tokio::sync::Notify;

use crate::config::{self, AppConfig};
use crate::db::{self, DatabaseError};
use crate::dialog::DialogSessions;
use crate::error::BotError;
use crate::models::UserId;
use crate::report;
use crate::transport::{self, DeliveryError, Keyboard, Transport};
use crate::triage::AiClient;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    db_path: PathBuf,
    /// Generated PDF reports land here.
    pub reports_dir: PathBuf,
    /// TTF embedded into reports; `None` falls back to transliteration.
    pub report_font: Option<PathBuf>,
    /// Upper bound on one AI round trip.
    pub ai_timeout: Duration,
    sessions: DialogSessions,
    ai: Arc<dyn AiClient>,
    transport: Arc<dyn Transport>,
    /// Wakes the scheduler so it rebuilds its triggers immediately.
    scheduler_refresh: Notify,
}

impl CoreState {
    pub fn new(
        db_path: PathBuf,
        reports_dir: PathBuf,
        ai: Arc<dyn AiClient>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            db_path,
            reports_dir,
            report_font: None,
            ai_timeout: Duration::from_secs(config::DEFAULT_AI_TIMEOUT_SECS),
            sessions: DialogSessions::new(),
            ai,
            transport,
            scheduler_refresh: Notify::new(),
        }
    }

    /// Wires paths and limits from the environment-driven config.
    pub fn from_config(
        cfg: &AppConfig,
        ai: Arc<dyn AiClient>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let font = std::env::var_os(report::FONT_ENV).map(PathBuf::from);
        let mut state = Self::new(cfg.database_path(), cfg.reports_dir(), ai, transport)
            .with_ai_timeout(cfg.ai_timeout);
        state.report_font = report::locate_font(font, &cfg.data_dir);
        state
    }

    pub fn with_ai_timeout(mut self, timeout: Duration) -> Self {
        self.ai_timeout = timeout;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ── Store access ────────────────────────────────────────

    /// Open a connection. The schema is migrated once at startup.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_connection(&self.db_path)
    }

    /// Runs one logical Store operation on a fresh connection.
    ///
    /// The connection is dropped before this returns, so callers never
    /// hold it across an await point. Operations run inline on the async
    /// worker: each is a handful of indexed single-user statements on a
    /// local file, and the per-user session lock already serialises a
    /// user's events. Long CPU work (PDF rendering) goes through
    /// `spawn_blocking` instead.
    pub fn with_db<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, BotError> {
        let mut conn = self.open_db()?;
        Ok(op(&mut conn)?)
    }

    // ── Collaborators ───────────────────────────────────────

    pub fn sessions(&self) -> &DialogSessions {
        &self.sessions
    }

    pub fn ai(&self) -> &dyn AiClient {
        self.ai.as_ref()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Sends `text`, split into several messages when it is too long.
    /// The keyboard goes with the last part.
    pub async fn send(
        &self,
        user_id: UserId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), DeliveryError> {
        let mut parts = transport::split_message(text, transport::MAX_MESSAGE_LEN);
        let last = parts.pop().unwrap_or_default();
        for part in &parts {
            self.transport.send_message(user_id, part, None).await?;
        }
        self.transport.send_message(user_id, &last, keyboard).await
    }

    // ── Scheduler coupling ──────────────────────────────────

    /// Signal that medication data changed.
    pub fn refresh_scheduler(&self) {
        self.scheduler_refresh.notify_one();
    }

    pub async fn scheduler_refreshed(&self) {
        self.scheduler_refresh.notified().await;
    }

    /// Local wall-clock time; the bot runs in the users' time zone.
    pub fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
