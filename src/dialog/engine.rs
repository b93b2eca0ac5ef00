//! Executes dialog effects.
//!
//! `handle` is the single entry point for inbound events. Stateless
//! callbacks (privacy choice, medication actions, cycle buttons) run
//! without touching the dialog session. Everything else takes the user's
//! session lock, asks the pure transition table what to do and runs the
//! resulting effect against the Store, the AI provider and the transport.

use tracing::{debug, error, info, warn};

use super::input::{CallbackAction, CycleAction, Input};
use super::machine::{self, Effect, Transition, View};
use super::state::DialogState;
use crate::config::HISTORY_LIMIT;
use crate::core_state::CoreState;
use crate::db;
use crate::error::BotError;
use crate::insights::{self, CYCLE_HISTORY};
use crate::messages;
use crate::models::{AchievementCode, CheckinAnswers, UserId, UserProfile};
use crate::recommendation;
use crate::report::{self, ReportError};
use crate::transport::Keyboard;
use crate::triage::{self, TriageOutcome, TriagePrompt, TriageRequest};

/// Streak length that earns the streak achievement.
const STREAK_ACHIEVEMENT_DAYS: u32 = 5;

/// One classified inbound event.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub user_id: UserId,
    pub first_name: String,
    pub input: Input,
}

impl Inbound {
    pub fn new(user_id: UserId, first_name: impl Into<String>, input: Input) -> Self {
        Self {
            user_id,
            first_name: first_name.into(),
            input,
        }
    }
}

pub async fn handle(core: &CoreState, inbound: Inbound) {
    let Inbound { user_id, first_name, input } = inbound;

    if let Err(err) = core.with_db(|conn| db::ensure_user(conn, user_id, &first_name)) {
        report_failure(core, user_id, &err).await;
        return;
    }

    match input {
        Input::Callback(action) if action.is_stateless() => {
            if let Err(err) = on_stateless(core, user_id, action).await {
                report_failure(core, user_id, &err).await;
            }
        }
        input => run_dialog(core, user_id, input).await,
    }
}

async fn run_dialog(core: &CoreState, user_id: UserId, input: Input) {
    let session = core.sessions().session(user_id);
    let mut state = session.lock().await;

    let Transition { next, effect } = machine::transition(&state, &input);
    debug!(user_id, from = state.tag(), to = next.tag(), "Dialog transition");

    match execute(core, user_id, effect).await {
        Ok(Some(decided)) => *state = decided,
        Ok(None) => *state = next,
        Err(err) => {
            report_failure(core, user_id, &err).await;
            *state = match err {
                BotError::NotFound(_) => next,
                _ => DialogState::Idle,
            };
        }
    }
}

/// Logs the failure and tells the user in generic terms.
async fn report_failure(core: &CoreState, user_id: UserId, err: &BotError) {
    if err.is_recoverable() {
        warn!(user_id, error = %err, "Event handling failed");
    } else {
        error!(user_id, error = %err, "Event handling failed");
    }

    // The user cannot be told about a failed delivery.
    if matches!(err, BotError::Delivery(_)) {
        return;
    }
    let menu = main_menu_for(core, user_id);
    if let Err(send_err) = core.send(user_id, err.user_message(), Some(menu)).await {
        warn!(user_id, error = %send_err, "Could not deliver failure notice");
    }
}

/// Main menu for the user, with the women's-health row when applicable.
fn main_menu_for(core: &CoreState, user_id: UserId) -> Keyboard {
    let is_female = core
        .with_db(|conn| db::get_user(conn, user_id))
        .ok()
        .flatten()
        .is_some_and(|p| p.is_female());
    messages::main_menu(is_female)
}

fn require_profile(core: &CoreState, user_id: UserId) -> Result<UserProfile, BotError> {
    core.with_db(|conn| db::get_user(conn, user_id))?
        .ok_or_else(|| BotError::NotFound(format!("User {user_id}")))
}

// ═══════════════════════════════════════════════════════════
// Dialog effects
// ═══════════════════════════════════════════════════════════

/// Runs one effect. `Some(state)` overrides the table's next state.
async fn execute(
    core: &CoreState,
    user_id: UserId,
    effect: Effect,
) -> Result<Option<DialogState>, BotError> {
    match effect {
        Effect::None => {}
        Effect::Ask(question) => {
            let (text, keyboard) = messages::question(question);
            core.send(user_id, &text, Some(keyboard)).await?;
        }
        Effect::Reject(reason, question) => {
            debug!(user_id, reason = %reason, "Answer rejected");
            let (text, keyboard) = messages::rejected(&reason, question);
            core.send(user_id, &text, Some(keyboard)).await?;
        }
        Effect::Cancelled => {
            core.send(user_id, messages::cancelled(), Some(main_menu_for(core, user_id)))
                .await?;
        }
        Effect::Welcome => {
            let (text, keyboard) = messages::welcome();
            core.send(user_id, &text, Some(keyboard)).await?;
        }
        Effect::Show(view) => show(core, user_id, view).await?,
        Effect::GenerateReport => generate_report(core, user_id).await?,
        Effect::CommitCheckin(answers) => commit_checkin(core, user_id, &answers).await?,
        Effect::SaveNote(text) => {
            let now = core.now();
            let entry_id = core.with_db(|conn| db::record_note(conn, user_id, &text, now))?;
            info!(user_id, entry_id, "Quick note saved");
            core.send(user_id, messages::note_saved(), Some(main_menu_for(core, user_id)))
                .await?;
            award(core, user_id, AchievementCode::FirstNote).await?;
        }
        Effect::SaveProfileField(field, value) => {
            core.with_db(|conn| db::update_user_field(conn, user_id, field, &value))?;
            info!(user_id, field = field.as_str(), "Profile field updated");
            // Menu is rebuilt after the write: a gender change toggles a row.
            let text = messages::profile_saved(field);
            core.send(user_id, &text, Some(main_menu_for(core, user_id))).await?;
        }
        Effect::SaveMedication(medication) => {
            let med_id = core.with_db(|conn| db::add_medication(conn, user_id, &medication))?;
            info!(user_id, med_id, schedule = %medication.schedule, "Medication added");
            core.refresh_scheduler();
            let text = messages::medication_saved(&medication);
            core.send(user_id, &text, Some(main_menu_for(core, user_id))).await?;
        }
        Effect::Delegate(request) => return triage_round(core, user_id, request).await.map(Some),
    }
    Ok(None)
}

async fn show(core: &CoreState, user_id: UserId, view: View) -> Result<(), BotError> {
    match view {
        View::Profile => {
            let profile = require_profile(core, user_id)?;
            let (text, keyboard) = messages::profile_card(&profile);
            core.send(user_id, &text, Some(keyboard)).await?;
        }
        View::Medications => {
            let meds = core.with_db(|conn| db::get_active_medications(conn, user_id))?;
            let (text, keyboard) = messages::medications(&meds);
            core.send(user_id, &text, Some(keyboard)).await?;
        }
        View::History => {
            let entries = core.with_db(|conn| db::get_user_history(conn, user_id, HISTORY_LIMIT))?;
            let text = messages::history(&entries);
            core.send(user_id, &text, Some(main_menu_for(core, user_id))).await?;
        }
        View::EmergencyCard => {
            let profile = require_profile(core, user_id)?;
            core.send(user_id, &messages::emergency_card(&profile), None).await?;
        }
        View::Privacy => {
            core.send(user_id, &messages::privacy_link(), None).await?;
        }
        View::WomensHealth => {
            let profile = require_profile(core, user_id)?;
            if profile.is_female() {
                let (text, keyboard) = messages::womens_health_menu();
                core.send(user_id, &text, Some(keyboard)).await?;
            } else {
                let menu = messages::main_menu(false);
                core.send(user_id, messages::womens_health_unavailable(), Some(menu)).await?;
            }
        }
        View::IdleHint => {
            core.send(user_id, messages::idle_hint(), Some(main_menu_for(core, user_id)))
                .await?;
        }
    }
    Ok(())
}

async fn commit_checkin(
    core: &CoreState,
    user_id: UserId,
    answers: &CheckinAnswers,
) -> Result<(), BotError> {
    let now = core.now();
    let outcome = core.with_db(|conn| db::complete_checkin(conn, user_id, answers, now))?;
    info!(user_id, entry_id = outcome.entry_id, streak = outcome.streak, "Check-in saved");

    let menu = main_menu_for(core, user_id);
    core.send(user_id, messages::checkin_saved(), Some(menu)).await?;
    core.send(user_id, &recommendation::daily_recommendation(answers), None).await?;

    if outcome.streak > 1 {
        core.send(user_id, &messages::streak(outcome.streak), None).await?;
    }
    if outcome.streak >= STREAK_ACHIEVEMENT_DAYS {
        award(core, user_id, AchievementCode::Streak5Days).await?;
    }
    Ok(())
}

async fn generate_report(core: &CoreState, user_id: UserId) -> Result<(), BotError> {
    let profile = require_profile(core, user_id)?;
    let history = core.with_db(|conn| db::get_user_history(conn, user_id, HISTORY_LIMIT))?;
    let menu = messages::main_menu(profile.is_female());

    if history.is_empty() {
        core.send(user_id, messages::report_no_data(), Some(menu)).await?;
        return Ok(());
    }

    let out_dir = core.reports_dir.clone();
    let font = core.report_font.clone();
    let today = core.now().date();
    let path = tokio::task::spawn_blocking(move || {
        report::render(&profile, &history, &out_dir, font.as_deref(), today)
    })
    .await
    .map_err(|e| ReportError::Pdf(format!("render task failed: {e}")))??;

    core.transport()
        .send_document(user_id, &path, Some(messages::report_caption()))
        .await?;
    info!(user_id, path = %path.display(), "Report delivered");
    award(core, user_id, AchievementCode::FirstReport).await
}

/// One delegation to the AI provider. Returns the state the user ends in.
async fn triage_round(
    core: &CoreState,
    user_id: UserId,
    request: TriageRequest,
) -> Result<DialogState, BotError> {
    let profile = core.with_db(|conn| db::get_user(conn, user_id))?;
    let prompt = TriagePrompt::build(profile.as_ref(), &request);
    let menu = messages::main_menu(profile.as_ref().is_some_and(UserProfile::is_female));

    core.send(user_id, messages::triage_thinking(), None).await?;
    let result = triage::ask(core.ai(), &prompt, core.ai_timeout).await;

    // Every exchange is kept, failed ones included.
    let logged = match &result {
        Ok(response) => response.clone(),
        Err(err) => format!("[error] {err}"),
    };
    let now = core.now();
    core.with_db(|conn| db::log_ai_interaction(conn, user_id, &prompt.user, &logged, now))?;

    let outcome = triage::classify(&result?, request.round);
    let text = messages::triage_response(&outcome);
    match outcome {
        TriageOutcome::Clarify(_) => {
            info!(user_id, round = request.round, "Triage asked a clarifying question");
            core.send(user_id, &text, Some(messages::cancel_keyboard())).await?;
            Ok(DialogState::AwaitingClarification {
                symptoms: request.symptoms,
                round: request.round,
            })
        }
        TriageOutcome::Final(_) => {
            info!(user_id, round = request.round, "Triage answered");
            core.send(user_id, &text, Some(menu)).await?;
            Ok(DialogState::Idle)
        }
    }
}

/// Grants `code` once and announces it on the first grant only.
async fn award(core: &CoreState, user_id: UserId, code: AchievementCode) -> Result<(), BotError> {
    if let Some(achievement) = core.with_db(|conn| db::grant_achievement(conn, user_id, code))? {
        info!(user_id, code = code.as_str(), "Achievement granted");
        core.send(user_id, &messages::achievement_unlocked(&achievement), None).await?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Stateless callbacks
// ═══════════════════════════════════════════════════════════

async fn on_stateless(
    core: &CoreState,
    user_id: UserId,
    action: CallbackAction,
) -> Result<(), BotError> {
    match action {
        CallbackAction::Privacy { accepted } => {
            info!(user_id, accepted, "Privacy notice answered");
            core.send(user_id, messages::privacy_choice(accepted), None).await?;
            core.send(user_id, messages::choose_action(), Some(main_menu_for(core, user_id)))
                .await?;
        }
        CallbackAction::DeactivateMedication(med_id) => {
            match core.with_db(|conn| db::deactivate_medication(conn, user_id, med_id)) {
                Ok(()) => {
                    info!(user_id, med_id, "Medication deactivated");
                    core.refresh_scheduler();
                    core.send(user_id, messages::medication_deactivated(), None).await?;
                    show(core, user_id, View::Medications).await?;
                }
                Err(BotError::NotFound(_)) => {
                    warn!(user_id, med_id, "Deactivate callback for unknown medication");
                    core.send(user_id, messages::medication_not_found(), None).await?;
                }
                Err(err) => return Err(err),
            }
        }
        CallbackAction::MedicationLog { med_id, status } => {
            let now = core.now();
            match core.with_db(|conn| db::log_medication_status(conn, user_id, med_id, status, now)) {
                Ok(log_id) => {
                    info!(user_id, med_id, log_id, status = status.as_str(), "Medication intake logged");
                    core.send(user_id, messages::medication_logged(status), None).await?;
                }
                Err(BotError::NotFound(_)) => {
                    warn!(user_id, med_id, "Reminder answer for unknown medication");
                    core.send(user_id, messages::medication_not_found(), None).await?;
                }
                Err(err) => return Err(err),
            }
        }
        CallbackAction::Cycle(cycle) => on_cycle(core, user_id, cycle).await?,
        other => debug!(user_id, callback = %other.encode(), "Dialog callback routed as stateless"),
    }
    Ok(())
}

async fn on_cycle(core: &CoreState, user_id: UserId, action: CycleAction) -> Result<(), BotError> {
    let today = core.now().date();
    let text = match action {
        CycleAction::Start => {
            let started = core.with_db(|conn| db::start_cycle(conn, user_id, today))?;
            info!(user_id, started, "Cycle start requested");
            messages::cycle_started(started).to_string()
        }
        CycleAction::End => {
            let ended = core.with_db(|conn| db::end_cycle(conn, user_id, today))?;
            info!(user_id, ended, "Cycle end requested");
            messages::cycle_ended(ended).to_string()
        }
        CycleAction::Predict => {
            let closed = core.with_db(|conn| db::get_closed_cycles(conn, user_id, CYCLE_HISTORY))?;
            messages::cycle_prediction(insights::predict_cycle(&closed))
        }
    };
    core.send(user_id, &text, None).await?;
    Ok(())
}
