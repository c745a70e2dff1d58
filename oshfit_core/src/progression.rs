//! Per-exercise progression analysis.
//!
//! Exercises are identified by their record name. All weights are compared in
//! kilograms so kg and lb entries of the same lift line up.

use crate::temporal::iso_week_start;
use crate::{chronological, Session};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// One dated occurrence of an exercise
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExercisePoint {
    pub session_id: Uuid,
    pub performed_at: DateTime<FixedOffset>,
    pub kg_weight: f64,
    pub volume_kg: f64,
}

/// Every occurrence of `name`, oldest first
pub fn exercise_history(sessions: &[Session], name: &str) -> Vec<ExercisePoint> {
    chronological(sessions)
        .into_iter()
        .flat_map(|session| {
            session
                .exercises
                .iter()
                .filter(move |e| e.name == name)
                .map(move |e| ExercisePoint {
                    session_id: session.id,
                    performed_at: session.performed_at,
                    kg_weight: e.kg_weight(),
                    volume_kg: e.volume_kg(),
                })
        })
        .collect()
}

/// Distinct exercise names across the history
pub fn exercise_names(sessions: &[Session]) -> BTreeSet<&str> {
    sessions
        .iter()
        .flat_map(|s| s.exercises.iter().map(|e| e.name.as_str()))
        .collect()
}

/// Percentage change between the first and the last recorded weight of `name`.
///
/// Returns 0 with fewer than two occurrences or a zero starting weight.
pub fn percent_increase(sessions: &[Session], name: &str) -> f64 {
    let history = exercise_history(sessions, name);

    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return 0.0;
    };
    if history.len() < 2 || first.kg_weight <= 0.0 {
        return 0.0;
    }

    (last.kg_weight - first.kg_weight) / first.kg_weight * 100.0
}

/// Best [`percent_increase`] over every exercise, never below 0
pub fn max_percent_increase_across_exercises(sessions: &[Session]) -> f64 {
    exercise_names(sessions)
        .into_iter()
        .map(|name| percent_increase(sessions, name))
        .fold(0.0, f64::max)
}

/// Heaviest kg weight of `name` in each ISO week, keyed by the week's Monday
fn weekly_maxima(sessions: &[Session], name: &str) -> BTreeMap<NaiveDate, f64> {
    let mut weekly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for point in exercise_history(sessions, name) {
        let week = iso_week_start(point.performed_at.date_naive());
        let best = weekly.entry(week).or_insert(point.kg_weight);
        if point.kg_weight > *best {
            *best = point.kg_weight;
        }
    }
    weekly
}

/// Longest run of strictly increasing week-over-week maxima for `name`.
///
/// Counts increases: three weeks of 60, 62.5, 65 kg is a streak of 2. Weeks
/// without the exercise are skipped rather than breaking the run.
pub fn consecutive_weekly_increase_streak(sessions: &[Session], name: &str) -> u32 {
    let maxima: Vec<f64> = weekly_maxima(sessions, name).into_values().collect();

    let mut best = 0;
    let mut current = 0;
    for pair in maxima.windows(2) {
        if pair[1] > pair[0] {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Best weekly increase streak over every exercise
pub fn max_weekly_increase_streak(sessions: &[Session]) -> u32 {
    exercise_names(sessions)
        .into_iter()
        .map(|name| consecutive_weekly_increase_streak(sessions, name))
        .max()
        .unwrap_or(0)
}
