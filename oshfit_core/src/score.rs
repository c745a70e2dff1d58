//! Session scoring.
//!
//! A session's score is the mean over its exercises of a weighted composite:
//! 60 points per 100 kg lifted, 25 points at effort 10, and 15 points per
//! 1000 kg of volume. Weights are compared in kilograms, bar excluded.

use crate::{chronological, ExerciseRecord, Session};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

const WEIGHT_POINTS: f64 = 60.0;
const EFFORT_POINTS: f64 = 25.0;
const VOLUME_POINTS: f64 = 15.0;

/// Score of one session in the trend
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ScorePoint {
    pub session_id: Uuid,
    pub performed_at: DateTime<FixedOffset>,
    pub score: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn exercise_score(record: &ExerciseRecord) -> f64 {
    let kg = record.kg_weight();
    let volume = kg * f64::from(record.sets) * f64::from(record.reps_per_set);

    kg / 100.0 * WEIGHT_POINTS
        + f64::from(record.effort) / 10.0 * EFFORT_POINTS
        + volume / 1000.0 * VOLUME_POINTS
}

/// Mean exercise score of a session, rounded to one decimal. Empty sessions score 0.
pub fn session_score(session: &Session) -> f64 {
    if session.exercises.is_empty() {
        return 0.0;
    }

    let total: f64 = session.exercises.iter().map(exercise_score).sum();
    round1(total / session.exercises.len() as f64)
}

/// One score per session, oldest first
pub fn score_trend(sessions: &[Session]) -> Vec<ScorePoint> {
    chronological(sessions)
        .into_iter()
        .map(|s| ScorePoint {
            session_id: s.id,
            performed_at: s.performed_at,
            score: session_score(s),
        })
        .collect()
}

/// Whether the most recent session scored strictly higher than the one before it
pub fn score_improved(sessions: &[Session]) -> bool {
    match score_trend(sessions).as_slice() {
        [.., previous, latest] => latest.score > previous.score,
        _ => false,
    }
}

/// Score of the most recent session
pub fn latest_score(sessions: &[Session]) -> Option<f64> {
    chronological(sessions).last().map(|s| session_score(s))
}
