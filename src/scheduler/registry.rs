//! Time-of-day triggers.
//!
//! The registry is a value rebuilt from the Store on every scheduler wake.
//! It is never patched incrementally: a medication that disappears from
//! the active set simply has no triggers in the next rebuild. The only
//! thing carried across rebuilds is each surviving trigger's `next_run`,
//! so a trigger that became due just before a rebuild still fires.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};

use crate::config::{self, WEEKLY_REPORT_DAY};
use crate::dialog::validation::schedule_times;
use crate::models::{Medication, UserId};

/// Identity of a trigger across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TriggerKey {
    Medication { med_id: i64, at: NaiveTime },
    WeeklyReport { user_id: UserId },
}

/// What to send when a trigger fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerAction {
    Reminder {
        user_id: UserId,
        med_id: i64,
        name: String,
        dosage: String,
    },
    WeeklyReport {
        user_id: UserId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub key: TriggerKey,
    pub action: TriggerAction,
    pub next_run: NaiveDateTime,
}

impl TriggerKey {
    /// First occurrence strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            TriggerKey::Medication { at, .. } => {
                let candidate = now.date().and_time(*at);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(1)
                }
            }
            TriggerKey::WeeklyReport { .. } => {
                let target = WEEKLY_REPORT_DAY.num_days_from_monday() as i64;
                let today = now.weekday().num_days_from_monday() as i64;
                let ahead = (target - today).rem_euclid(7);
                let candidate = (now.date() + Duration::days(ahead)).and_time(config::weekly_report_time());
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(7)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TriggerRegistry {
    triggers: BTreeMap<TriggerKey, Trigger>,
}

impl TriggerRegistry {
    /// Fresh registry: one daily trigger per schedule token of every active
    /// medication plus one weekly report trigger per recipient.
    pub fn build(medications: &[Medication], recipients: &[UserId], now: NaiveDateTime) -> Self {
        Self::default().rebuild(medications, recipients, now)
    }

    /// New registry from current Store data, keeping `next_run` of triggers
    /// that survive.
    pub fn rebuild(
        &self,
        medications: &[Medication],
        recipients: &[UserId],
        now: NaiveDateTime,
    ) -> Self {
        let mut triggers = BTreeMap::new();

        let medication_triggers = medications.iter().filter(|m| m.is_active).flat_map(|m| {
            schedule_times(&m.schedule).into_iter().map(move |at| {
                (
                    TriggerKey::Medication { med_id: m.med_id, at },
                    TriggerAction::Reminder {
                        user_id: m.user_id,
                        med_id: m.med_id,
                        name: m.name.clone(),
                        dosage: m.dosage.clone(),
                    },
                )
            })
        });
        let report_triggers = recipients.iter().map(|&user_id| {
            (
                TriggerKey::WeeklyReport { user_id },
                TriggerAction::WeeklyReport { user_id },
            )
        });

        for (key, action) in medication_triggers.chain(report_triggers) {
            let next_run = self
                .triggers
                .get(&key)
                .map(|t| t.next_run)
                .unwrap_or_else(|| key.next_after(now));
            triggers.insert(key, Trigger { key, action, next_run });
        }

        Self { triggers }
    }

    /// Actions of every trigger due at `now`. Each fires once, then moves to
    /// its next occurrence after `now`; missed occurrences are not replayed.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<TriggerAction> {
        let mut due = Vec::new();
        for trigger in self.triggers.values_mut() {
            if trigger.next_run <= now {
                due.push(trigger.action.clone());
                trigger.next_run = trigger.key.next_after(now);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn medication_trigger_count(&self, med_id: i64) -> usize {
        self.triggers
            .keys()
            .filter(|k| matches!(k, TriggerKey::Medication { med_id: id, .. } if *id == med_id))
            .count()
    }

    pub fn get(&self, key: &TriggerKey) -> Option<&Trigger> {
        self.triggers.get(key)
    }

    /// Earliest pending run, if any.
    pub fn next_due(&self) -> Option<NaiveDateTime> {
        self.triggers.values().map(|t| t.next_run).min()
    }
}
