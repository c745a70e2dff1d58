//! Core domain types for the Oshfit achievement engine.
//!
//! This module defines the canonical in-memory representation that every
//! analyzer works on:
//! - Weight units and workout categories
//! - Exercise records and sessions
//! - Per-user achievement state

use crate::normalize::to_kilograms;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Units and Categories
// ============================================================================

/// Unit a weight was entered in
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    #[serde(alias = "lbs")]
    Lb,
}

impl WeightUnit {
    /// Parse a unit label as it appears in stored records.
    ///
    /// Returns None for labels that name no known unit.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilo" | "kilos" => Some(WeightUnit::Kg),
            "lb" | "lbs" | "pound" | "pounds" => Some(WeightUnit::Lb),
            _ => None,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightUnit::Kg => write!(f, "kg"),
            WeightUnit::Lb => write!(f, "lb"),
        }
    }
}

/// Split-routine category a session belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkoutCategory {
    #[serde(alias = "push")]
    Push,
    #[serde(alias = "pull")]
    Pull,
    #[serde(alias = "legs")]
    Legs,
}

impl WorkoutCategory {
    pub const ALL: [WorkoutCategory; 3] = [
        WorkoutCategory::Push,
        WorkoutCategory::Pull,
        WorkoutCategory::Legs,
    ];

    /// Case-insensitive parse of a category label
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "push" => Some(WorkoutCategory::Push),
            "pull" => Some(WorkoutCategory::Pull),
            "legs" | "leg" => Some(WorkoutCategory::Legs),
            _ => None,
        }
    }
}

impl fmt::Display for WorkoutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutCategory::Push => write!(f, "Push"),
            WorkoutCategory::Pull => write!(f, "Pull"),
            WorkoutCategory::Legs => write!(f, "Legs"),
        }
    }
}

// ============================================================================
// Exercise Records and Sessions
// ============================================================================

/// One exercise performed within a session, fully populated.
///
/// Only [`crate::normalize::normalize_exercise`] builds these from stored
/// data, so every field can be relied on downstream.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseRecord {
    pub name: String,
    pub weight: f64,
    pub unit: WeightUnit,
    pub sets: u32,
    pub reps_per_set: u32,
    pub bar_weight: f64,
    pub include_bar_weight: bool,
    /// Perceived effort 1-10, 0 when not recorded
    pub effort: u8,
    /// Logged under the primary exercise's name but performed as its alternative
    pub use_alternative: bool,
}

impl ExerciseRecord {
    /// The record every missing or null input collapses to
    pub fn zero() -> Self {
        Self {
            name: "Unknown".into(),
            weight: 0.0,
            unit: WeightUnit::Kg,
            sets: 1,
            reps_per_set: 0,
            bar_weight: 0.0,
            include_bar_weight: false,
            effort: 0,
            use_alternative: false,
        }
    }

    /// Displayed weight in kilograms
    pub fn kg_weight(&self) -> f64 {
        to_kilograms(self.weight, self.unit)
    }

    /// Weight actually moved in kilograms, bar included when flagged
    pub fn load_kg(&self) -> f64 {
        let bar = if self.include_bar_weight {
            self.bar_weight
        } else {
            0.0
        };
        to_kilograms(self.weight + bar, self.unit)
    }

    /// Total volume (load × sets × reps) in kilograms
    pub fn volume_kg(&self) -> f64 {
        self.load_kg() * f64::from(self.sets) * f64::from(self.reps_per_set)
    }

    /// Whether every performance field was filled in
    pub fn is_complete(&self) -> bool {
        self.weight > 0.0 && self.sets > 0 && self.reps_per_set > 0 && self.effort > 0
    }
}

/// A logged training occasion
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: Uuid,
    /// Kept in the offset it was logged in; calendar logic uses this wall clock
    pub performed_at: DateTime<FixedOffset>,
    /// False when the stored record carried a date but no time of day
    pub time_recorded: bool,
    pub category: WorkoutCategory,
    pub body_weight: Option<f64>,
    pub body_weight_unit: WeightUnit,
    pub notes: Option<String>,
    pub duration_minutes: Option<u32>,
    pub cardio_after: bool,
    pub cardio_minutes: Option<u32>,
    pub exercises: Vec<ExerciseRecord>,
}

impl Session {
    /// Calendar day of the session in its own offset
    pub fn local_date(&self) -> NaiveDate {
        self.performed_at.date_naive()
    }

    /// Wall-clock hour, if the record carried a time of day
    pub fn local_hour(&self) -> Option<u32> {
        self.time_recorded.then(|| self.performed_at.hour())
    }

    /// Mean perceived effort over the session's exercises (0 when empty)
    pub fn average_effort(&self) -> f64 {
        if self.exercises.is_empty() {
            return 0.0;
        }
        let total: f64 = self.exercises.iter().map(|e| f64::from(e.effort)).sum();
        total / self.exercises.len() as f64
    }

    /// Σ volume over all exercises, in kilograms
    pub fn volume_kg(&self) -> f64 {
        self.exercises.iter().map(ExerciseRecord::volume_kg).sum()
    }
}

/// Sessions in chronological order; ties on the timestamp fall back to the id
/// so every ordering is deterministic.
pub fn chronological(sessions: &[Session]) -> Vec<&Session> {
    let mut ordered: Vec<&Session> = sessions.iter().collect();
    ordered.sort_by(|a, b| {
        a.performed_at
            .cmp(&b.performed_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

// ============================================================================
// Achievement State
// ============================================================================

/// What an achievement measures
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    FirstOccurrence,
    Streak,
    PercentageThreshold,
    NumericThreshold,
    CompositeTemporal,
}

/// Lock status of one achievement; `Unlocked` is terminal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AchievementStatus {
    Locked,
    Unlocked { at: DateTime<Utc> },
}

/// Current/required pair for discrete-count achievements
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountProgress {
    pub current: u32,
    pub required: u32,
}

/// A user's standing on one achievement definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AchievementState {
    pub id: String,
    pub status: AchievementStatus,
    /// Always within [0, 1]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<CountProgress>,
}

impl AchievementState {
    /// Fresh, locked state with no progress
    pub fn locked(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: AchievementStatus::Locked,
            progress: 0.0,
            count: None,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.status, AchievementStatus::Unlocked { .. })
    }

    pub fn unlocked_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            AchievementStatus::Unlocked { at } => Some(at),
            AchievementStatus::Locked => None,
        }
    }
}

/// Persisted achievement states of one user
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserAchievements {
    pub states: Vec<AchievementState>,
}

/// Everything the engine needs to know about one user
#[derive(Clone, Debug, Default)]
pub struct UserHistory {
    pub sessions: Vec<Session>,
    pub achievements: Vec<AchievementState>,
}
