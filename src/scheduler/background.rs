//! Background scheduler task.
//!
//! Wakes every `SCHEDULER_TICK`, or immediately when medication data
//! changes, rebuilds the trigger registry from the Store and dispatches
//! every due trigger on its own task. A failed delivery is logged and
//! never reaches the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::registry::{TriggerAction, TriggerRegistry};
use crate::config::SCHEDULER_TICK;
use crate::core_state::CoreState;
use crate::db;
use crate::error::BotError;
use crate::insights;
use crate::messages;
use crate::models::{Medication, UserId};

/// Weekly summaries compare the last week with the one before it.
const DIGEST_WINDOW_DAYS: i64 = 14;

/// Start the scheduler on the current runtime.
pub fn start_scheduler(core: Arc<CoreState>) -> JoinHandle<()> {
    tokio::spawn(scheduler_loop(core, SCHEDULER_TICK))
}

async fn scheduler_loop(core: Arc<CoreState>, tick: Duration) {
    info!(tick_secs = tick.as_secs(), "Scheduler started");
    let mut registry = TriggerRegistry::default();
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = core.scheduler_refreshed() => debug!("Scheduler refresh requested"),
        }
        let now = core.now();
        wake(&core, &mut registry, now);
    }
}

/// One wake cycle: rebuild from the Store, then dispatch what is due.
///
/// Returns the handles of the spawned deliveries.
pub fn wake(
    core: &Arc<CoreState>,
    registry: &mut TriggerRegistry,
    now: NaiveDateTime,
) -> Vec<JoinHandle<()>> {
    match load_sources(core) {
        Ok((medications, recipients)) => {
            let rebuilt = registry.rebuild(&medications, &recipients, now);
            if rebuilt.len() != registry.len() {
                info!(
                    triggers = rebuilt.len(),
                    medications = medications.len(),
                    recipients = recipients.len(),
                    "Trigger registry rebuilt"
                );
            }
            *registry = rebuilt;
        }
        Err(err) => warn!(error = %err, "Trigger rebuild failed, keeping previous triggers"),
    }

    let evicted = core.sessions().evict_idle();
    if evicted > 0 {
        debug!(evicted, "Idle dialog sessions evicted");
    }

    registry
        .take_due(now)
        .into_iter()
        .map(|action| {
            let core = Arc::clone(core);
            tokio::spawn(async move {
                if let Err(err) = dispatch(&core, &action, now).await {
                    warn!(error = %err, action = ?action, "Scheduled delivery failed");
                }
            })
        })
        .collect()
}

fn load_sources(core: &CoreState) -> Result<(Vec<Medication>, Vec<UserId>), BotError> {
    core.with_db(|conn| {
        let medications = db::list_active_medications(conn)?;
        let recipients = db::list_report_recipients(conn)?;
        Ok((medications, recipients))
    })
}

async fn dispatch(core: &CoreState, action: &TriggerAction, now: NaiveDateTime) -> Result<(), BotError> {
    match action {
        TriggerAction::Reminder { user_id, med_id, name, dosage } => {
            let (text, keyboard) = messages::reminder(*med_id, name, dosage);
            core.send(*user_id, &text, Some(keyboard)).await?;
            info!(user_id, med_id, "Medication reminder sent");
        }
        TriggerAction::WeeklyReport { user_id } => {
            let since = now - chrono::Duration::days(DIGEST_WINDOW_DAYS);
            let entries = core.with_db(|conn| db::get_entries_since(conn, *user_id, since))?;
            match insights::weekly_digest(&entries, now) {
                Some(digest) => {
                    core.send(*user_id, &messages::weekly_digest(&digest), None).await?;
                    info!(user_id, "Weekly report sent");
                }
                None => debug!(user_id, "No entries in the last two weeks, weekly report skipped"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{CheckinAnswers, NewMedication};
    use crate::testing::TestCore;
    use crate::transport::Keyboard;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn add_med(t: &TestCore, user_id: UserId, name: &str, schedule: &str) -> i64 {
        t.core
            .with_db(|c| {
                db::ensure_user(c, user_id, "Test")?;
                db::add_medication(
                    c,
                    user_id,
                    &NewMedication {
                        name: name.into(),
                        dosage: "1 таб.".into(),
                        schedule: schedule.into(),
                    },
                )
            })
            .unwrap()
    }

    async fn join(handles: Vec<JoinHandle<()>>) -> usize {
        let count = handles.len();
        for h in handles {
            h.await.unwrap();
        }
        count
    }

    #[tokio::test]
    async fn due_reminder_is_sent_with_answer_buttons() {
        let t = TestCore::quiet();
        let med_id = add_med(&t, 1, "Аспірин", "09:00");
        let mut registry = TriggerRegistry::default();

        assert_eq!(join(wake(&t.core, &mut registry, at(2, 8, 59))).await, 0);
        assert_eq!(join(wake(&t.core, &mut registry, at(2, 9, 0))).await, 1);

        let sent = t.transport.last_to(1).unwrap();
        assert!(sent.text.contains("Аспірин"));
        let Some(Keyboard::Inline(rows)) = sent.keyboard else { panic!("expected buttons") };
        assert_eq!(rows[0][0].callback_data, format!("med_log:taken:{med_id}"));
    }

    #[tokio::test]
    async fn unreachable_user_does_not_block_others() {
        let t = TestCore::quiet();
        add_med(&t, 1, "Аспірин", "09:00");
        add_med(&t, 2, "Вітамін D", "09:00");
        t.transport.set_unreachable(1);

        let mut registry = TriggerRegistry::default();
        wake(&t.core, &mut registry, at(2, 8, 0));
        assert_eq!(join(wake(&t.core, &mut registry, at(2, 9, 0))).await, 2);

        assert!(t.transport.texts_to(1).is_empty());
        assert_eq!(t.transport.texts_to(2).len(), 1);
    }

    #[tokio::test]
    async fn deactivated_medication_stops_firing() {
        let t = TestCore::quiet();
        let med_id = add_med(&t, 1, "Аспірин", "09:00, 21:00");
        let mut registry = TriggerRegistry::default();
        wake(&t.core, &mut registry, at(2, 8, 0));
        assert_eq!(registry.medication_trigger_count(med_id), 2);

        t.core.with_db(|c| db::deactivate_medication(c, 1, med_id)).unwrap();
        assert_eq!(join(wake(&t.core, &mut registry, at(2, 9, 0))).await, 0);
        assert_eq!(registry.medication_trigger_count(med_id), 0);
    }

    #[tokio::test]
    async fn weekly_report_goes_to_users_with_entries() {
        let t = TestCore::quiet();
        t.core
            .with_db(|c| {
                db::ensure_user(c, 5, "Test")?;
                let answers = CheckinAnswers {
                    mood: "😊 Чудовий".into(),
                    sleep_quality: "добре".into(),
                    activity_level: "Середня".into(),
                    stress_level: "Низький".into(),
                    water_intake: "1-2 літри".into(),
                };
                db::complete_checkin(c, 5, &answers, at(6, 20, 0))
            })
            .unwrap();

        let mut registry = TriggerRegistry::default();
        wake(&t.core, &mut registry, at(7, 12, 0));
        assert_eq!(join(wake(&t.core, &mut registry, at(8, 10, 0))).await, 1);

        let text = t.transport.last_to(5).unwrap().text;
        assert!(text.contains("Ваш звіт за минулий тиждень"));
        assert!(text.contains("Check-in за тиждень: 1"));
    }
}
