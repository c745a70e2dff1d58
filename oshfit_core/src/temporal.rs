//! Temporal pattern detection over a session history.
//!
//! Everything here is recomputed from the session list on each call. Calendar
//! days are taken in the offset each session was logged in.

use crate::{chronological, Session};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Weekday};
use std::collections::{BTreeMap, BTreeSet};

/// Monday of the ISO week containing `date`.
///
/// Two dates share an ISO (year, week) bucket exactly when they share this
/// Monday, and consecutive buckets have Mondays 7 days apart, including
/// across week 52/53 → week 1.
pub fn iso_week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Length of the longest run of items where each is linked to its predecessor
fn longest_run<T: Copy>(items: impl IntoIterator<Item = T>, linked: impl Fn(T, T) -> bool) -> u32 {
    let mut best = 0;
    let mut current = 0;
    let mut previous: Option<T> = None;

    for item in items {
        current = match previous {
            Some(prev) if linked(prev, item) => current + 1,
            _ => 1,
        };
        best = best.max(current);
        previous = Some(item);
    }

    best
}

fn training_days(sessions: &[Session]) -> BTreeSet<NaiveDate> {
    sessions.iter().map(Session::local_date).collect()
}

/// Longest run of calendar days with at least one session each
pub fn longest_consecutive_day_streak(sessions: &[Session]) -> u32 {
    longest_run(training_days(sessions), |prev, next| {
        (next - prev).num_days() == 1
    })
}

/// Live streak ending on `today`, or on the day before if nothing was logged today yet
pub fn current_day_streak(sessions: &[Session], today: NaiveDate) -> u32 {
    let days = training_days(sessions);

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// Longest run of consecutive ISO weeks with a Saturday or Sunday session
pub fn consecutive_weekend_count(sessions: &[Session]) -> u32 {
    let weekend_weeks: BTreeSet<NaiveDate> = sessions
        .iter()
        .map(Session::local_date)
        .filter(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .map(iso_week_start)
        .collect();

    longest_run(weekend_weeks, |prev, next| (next - prev).num_days() == 7)
}

/// Gap between two sessions, in days, that still counts as "one week later"
const WEEKLY_GAP_DAYS: std::ops::RangeInclusive<f64> = 6.0..=8.0;

/// Longest run of weeks trained on the same weekday, over all seven weekdays.
///
/// Consecutive occurrences may be 6 to 8 days apart measured on the full
/// timestamps. Several sessions on one day count once (the earliest).
pub fn consecutive_same_weekday_count(sessions: &[Session]) -> u32 {
    let mut by_weekday: BTreeMap<u32, BTreeMap<NaiveDate, DateTime<FixedOffset>>> =
        BTreeMap::new();

    for session in chronological(sessions) {
        let day = session.local_date();
        by_weekday
            .entry(day.weekday().num_days_from_monday())
            .or_default()
            .entry(day)
            .or_insert(session.performed_at);
    }

    by_weekday
        .values()
        .map(|days| {
            longest_run(days.values().copied(), |prev, next| {
                let gap_days = (next - prev).num_seconds() as f64 / 86_400.0;
                WEEKLY_GAP_DAYS.contains(&gap_days)
            })
        })
        .max()
        .unwrap_or(0)
}
