//! Derived metrics: weekly mood summary and cycle prediction.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{Cycle, HealthEntry};

/// Closed cycles considered for the average.
pub const CYCLE_HISTORY: u32 = 5;

/// Mood trend changes smaller than this are reported as stable.
const TREND_THRESHOLD: f64 = 0.3;

pub fn mood_score(mood: &str) -> Option<u8> {
    match mood {
        "😊 Чудовий" => Some(3),
        "😐 Нормальний" => Some(2),
        "😞 Поганий" => Some(1),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodTrend {
    Improved,
    Stable,
    Declined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySummary {
    /// Average of scored moods, 1.0..=3.0.
    pub average_mood: Option<f64>,
    pub checkins: usize,
    pub notes: usize,
    /// Against the week before; `None` without scored moods in both weeks.
    pub trend: Option<MoodTrend>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeeklyDigest {
    /// Entries two weeks ago, none in the last seven days.
    NoRecentEntries,
    Summary(WeeklySummary),
}

fn average_mood<'a>(entries: impl Iterator<Item = &'a HealthEntry>) -> Option<f64> {
    let scores: Vec<f64> = entries
        .filter_map(|e| e.mood.as_deref().and_then(mood_score))
        .map(f64::from)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Summary of the last 7 days against the 7 before them.
///
/// Returns `None` when there is nothing at all in the 14-day window.
pub fn weekly_digest(entries: &[HealthEntry], now: NaiveDateTime) -> Option<WeeklyDigest> {
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);

    let last: Vec<&HealthEntry> = entries
        .iter()
        .filter(|e| e.timestamp > week_ago && e.timestamp <= now)
        .collect();
    let previous: Vec<&HealthEntry> = entries
        .iter()
        .filter(|e| e.timestamp > two_weeks_ago && e.timestamp <= week_ago)
        .collect();

    if last.is_empty() {
        return if previous.is_empty() {
            None
        } else {
            Some(WeeklyDigest::NoRecentEntries)
        };
    }

    let average = average_mood(last.iter().copied());
    let trend = match (average, average_mood(previous.iter().copied())) {
        (Some(now_avg), Some(prev_avg)) => Some(if now_avg - prev_avg > TREND_THRESHOLD {
            MoodTrend::Improved
        } else if prev_avg - now_avg > TREND_THRESHOLD {
            MoodTrend::Declined
        } else {
            MoodTrend::Stable
        }),
        _ => None,
    };

    Some(WeeklyDigest::Summary(WeeklySummary {
        average_mood: average,
        checkins: last.iter().filter(|e| e.is_checkin()).count(),
        notes: last.iter().filter(|e| e.note.is_some()).count(),
        trend,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePrediction {
    pub average_length_days: i64,
    pub next_start: NaiveDate,
}

/// Predicts the next start from closed cycles ordered newest first.
///
/// Needs at least two closed cycles; lengths are the gaps between
/// consecutive start dates.
pub fn predict_cycle(closed_newest_first: &[Cycle]) -> Option<CyclePrediction> {
    if closed_newest_first.len() < 2 {
        return None;
    }
    let gaps: Vec<i64> = closed_newest_first
        .windows(2)
        .map(|pair| (pair[0].start_date - pair[1].start_date).num_days())
        .collect();
    let average = gaps.iter().sum::<i64>() / gaps.len() as i64;
    if average <= 0 {
        return None;
    }
    Some(CyclePrediction {
        average_length_days: average,
        next_start: closed_newest_first[0].start_date + Duration::days(average),
    })
}
