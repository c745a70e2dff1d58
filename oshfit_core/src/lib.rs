#![forbid(unsafe_code)]

//! Core domain model and business logic for Oshfit.
//!
//! This crate provides:
//! - Domain types (sessions, exercise records, achievement states)
//! - Normalization of stored session records
//! - Temporal and per-exercise progression analysis
//! - Achievement catalog and evaluation engine
//! - Session scoring
//! - Persistence (session history, achievement state, CSV export)

pub mod types;
pub mod error;
pub mod normalize;
pub mod temporal;
pub mod progression;
pub mod score;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod engine;
pub mod history;
pub mod state;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{
    default_achievement_catalog, default_exercise_catalog, AchievementCatalog,
    AchievementDefinition, ExerciseCatalog, Rule,
};
pub use config::Config;
pub use engine::{evaluate, evaluate_session, provision, Evaluation};
pub use history::{HistoryLog, SessionSink};
pub use score::{latest_score, score_improved, score_trend, session_score, ScorePoint};
