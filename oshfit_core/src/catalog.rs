//! Default catalogs of exercises and achievement definitions.
//!
//! Both default catalogs are built once and cached. A catalog tuned by the
//! user's configuration is built with [`AchievementCatalog::from_config`] and
//! [`ExerciseCatalog::with_custom`].

use crate::config::AchievementConfig;
use crate::types::{AchievementKind, WorkoutCategory};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// Exercises
// ============================================================================

/// The substitute offered for an exercise when its equipment is busy
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlternativeExercise {
    pub id: String,
    pub name: String,
}

/// A gym exercise and its alternative
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: WorkoutCategory,
    pub alternative: AlternativeExercise,
}

impl Exercise {
    /// Whether a logged record name refers to this exercise (id or name, any case)
    pub fn matches(&self, record_name: &str) -> bool {
        names_match(&self.id, &self.name, record_name)
    }
}

impl AlternativeExercise {
    /// Whether a logged record name refers to this alternative (id or name, any case)
    pub fn matches(&self, record_name: &str) -> bool {
        names_match(&self.id, &self.name, record_name)
    }
}

fn names_match(id: &str, name: &str, record_name: &str) -> bool {
    let record_name = record_name.trim();
    record_name.eq_ignore_ascii_case(id) || record_name.to_lowercase() == name.to_lowercase()
}

/// The exercises a user picks from
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExerciseCatalog {
    pub exercises: Vec<Exercise>,
}

impl ExerciseCatalog {
    /// Every alternative in catalog order
    pub fn alternatives(&self) -> impl Iterator<Item = &AlternativeExercise> {
        self.exercises.iter().map(|e| &e.alternative)
    }

    /// Find an exercise by id or display name, ignoring case
    pub fn find(&self, name: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.matches(name))
    }

    pub fn by_category(&self, category: WorkoutCategory) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter().filter(move |e| e.category == category)
    }

    /// This catalog with user-defined exercises appended.
    ///
    /// Custom entries whose id is already taken are skipped with a warning.
    pub fn with_custom(&self, custom: &[Exercise]) -> Self {
        let mut catalog = self.clone();
        for exercise in custom {
            if catalog.exercises.iter().any(|e| e.id == exercise.id) {
                tracing::warn!(
                    "Custom exercise '{}' duplicates a catalog id, skipping",
                    exercise.id
                );
                continue;
            }
            catalog.exercises.push(exercise.clone());
        }
        catalog
    }

    /// Validate the catalog for consistency
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for exercise in &self.exercises {
            if exercise.id.trim().is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty name", exercise.id));
            }
            if exercise.alternative.id.trim().is_empty() {
                errors.push(format!(
                    "Exercise '{}' has an alternative with empty ID",
                    exercise.id
                ));
            }
            for id in [&exercise.id, &exercise.alternative.id] {
                if !id.is_empty() && !seen.insert(id.as_str()) {
                    errors.push(format!("Duplicate exercise ID '{}'", id));
                }
            }
        }

        errors
    }
}

fn exercise(
    id: &str,
    name: &str,
    category: WorkoutCategory,
    alternative_id: &str,
    alternative_name: &str,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        category,
        alternative: AlternativeExercise {
            id: alternative_id.into(),
            name: alternative_name.into(),
        },
    }
}

/// Cached default exercise catalog
static DEFAULT_EXERCISES: Lazy<ExerciseCatalog> = Lazy::new(build_default_exercise_catalog);

/// Get a reference to the cached default exercise catalog
pub fn default_exercise_catalog() -> &'static ExerciseCatalog {
    &DEFAULT_EXERCISES
}

/// Builds the default Push/Pull/Legs exercise list
pub fn build_default_exercise_catalog() -> ExerciseCatalog {
    use WorkoutCategory::{Legs, Pull, Push};

    let exercises = vec![
        // Push
        exercise("benchpress", "Barbell bench press", Push, "dumbbell-benchpress", "Dumbbell bench press"),
        exercise("shoulder-press", "Barbell overhead press", Push, "dumbbell-shoulder-press", "Dumbbell shoulder press"),
        exercise("butterfly", "Machine butterfly", Push, "peck-deck", "Pec deck"),
        exercise("tricep-extension", "Cable tricep extension", Push, "french-press", "EZ-bar French press"),
        exercise("lateral-raises", "Dumbbell lateral raises", Push, "cable-lateral-raises", "Cable lateral raises"),
        exercise("tricep-pushdown", "Tricep pushdown", Push, "dips", "Parallel bar dips"),
        // Pull
        exercise("deadlift", "Conventional deadlift", Pull, "sumo-deadlift", "Sumo deadlift"),
        exercise("pull-ups", "Pull-ups", Pull, "lat-pulldown", "Machine lat pulldown"),
        exercise("cable-row", "Cable row", Pull, "machine-row", "Machine row"),
        exercise("bicep-curl", "Barbell bicep curl", Pull, "dumbbell-curl", "Dumbbell bicep curl"),
        exercise("inverse-butterfly", "Inverse butterfly", Pull, "reverse-fly", "Cable reverse fly"),
        exercise("hammer-curl", "Hammer curl", Pull, "cable-hammer-curl", "Cable hammer curl"),
        // Legs
        exercise("squats", "Barbell back squat", Legs, "front-squats", "Barbell front squat"),
        exercise("bulgarian-squats", "Bulgarian split squat", Legs, "lunges", "Dumbbell lunges"),
        exercise("leg-press", "Leg press", Legs, "hack-squat", "Hack squat"),
        exercise("leg-extension", "Machine leg extension", Legs, "leg-extension-alt", "Leg extension variation"),
        exercise("leg-curl", "Leg curl", Legs, "leg-curl-machine", "Machine leg curl"),
        exercise("abduction", "Machine abduction", Legs, "adduction", "Machine adduction"),
        exercise("calf-press", "Seated calf raise", Legs, "standing-calf-raise", "Standing calf raise"),
    ];

    ExerciseCatalog { exercises }
}

// ============================================================================
// Achievements
// ============================================================================

/// The condition an achievement unlocks on
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    FirstSession,
    FirstOfCategory(WorkoutCategory),
    /// A session whose every record has weight, sets, reps and effort filled in
    PerfectLog,
    DayStreak(u32),
    /// Consecutive ISO weeks with a Saturday or Sunday session
    WeekendStreak(u32),
    SameWeekdayStreak(u32),
    WeightIncrease { percent: f64 },
    MaxEffort,
    HeavyLift { kg: f64 },
    SessionVolume { kg: f64 },
    DistinctExercises(u32),
    /// Push, Pull and Legs within one ISO week
    TripleCrown,
    EarlyBird { before_hour: u32 },
    NightOwl { from_hour: u32 },
    LongSession { minutes: u32 },
    EfficientSession { max_minutes: u32, min_avg_effort: f64 },
    /// Every alternative in the exercise catalog used at least once
    AlternativeCoverage,
    WeeklyIncreaseStreak(u32),
    ScoreImprovement,
}

impl Rule {
    pub fn kind(&self) -> AchievementKind {
        match self {
            Rule::FirstSession | Rule::FirstOfCategory(_) | Rule::PerfectLog | Rule::MaxEffort => {
                AchievementKind::FirstOccurrence
            }
            Rule::DayStreak(_)
            | Rule::WeekendStreak(_)
            | Rule::SameWeekdayStreak(_)
            | Rule::WeeklyIncreaseStreak(_) => AchievementKind::Streak,
            Rule::WeightIncrease { .. } | Rule::ScoreImprovement => {
                AchievementKind::PercentageThreshold
            }
            Rule::HeavyLift { .. }
            | Rule::SessionVolume { .. }
            | Rule::DistinctExercises(_)
            | Rule::AlternativeCoverage => AchievementKind::NumericThreshold,
            Rule::TripleCrown
            | Rule::EarlyBird { .. }
            | Rule::NightOwl { .. }
            | Rule::LongSession { .. }
            | Rule::EfficientSession { .. } => AchievementKind::CompositeTemporal,
        }
    }

    /// Description of a misconfigured threshold, if any
    fn threshold_error(&self) -> Option<String> {
        match *self {
            Rule::DayStreak(0)
            | Rule::WeekendStreak(0)
            | Rule::SameWeekdayStreak(0)
            | Rule::DistinctExercises(0)
            | Rule::WeeklyIncreaseStreak(0) => Some("count threshold is zero".into()),
            Rule::WeightIncrease { percent } if !(percent > 0.0) => {
                Some(format!("percentage threshold {} is not positive", percent))
            }
            Rule::HeavyLift { kg } | Rule::SessionVolume { kg } if !(kg > 0.0) => {
                Some(format!("weight threshold {} is not positive", kg))
            }
            Rule::EarlyBird { before_hour } if before_hour == 0 || before_hour > 24 => {
                Some(format!("hour {} can never be beaten", before_hour))
            }
            Rule::NightOwl { from_hour } if from_hour > 23 => {
                Some(format!("hour {} is not a time of day", from_hour))
            }
            Rule::LongSession { minutes: 0 } => Some("duration threshold is zero".into()),
            Rule::EfficientSession { max_minutes: 0, .. } => {
                Some("duration limit is zero".into())
            }
            _ => None,
        }
    }
}

/// One achievement a user can earn
#[derive(Clone, Debug, PartialEq)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
    pub rule: Rule,
}

impl AchievementDefinition {
    pub fn kind(&self) -> AchievementKind {
        self.rule.kind()
    }
}

/// Ordered set of achievement definitions
#[derive(Clone, Debug, PartialEq)]
pub struct AchievementCatalog {
    pub definitions: Vec<AchievementDefinition>,
}

impl AchievementCatalog {
    /// Build the standard definitions with thresholds taken from configuration
    pub fn from_config(config: &AchievementConfig) -> Self {
        fn def(
            id: &'static str,
            name: &'static str,
            description: &'static str,
            emoji: &'static str,
            rule: Rule,
        ) -> AchievementDefinition {
            AchievementDefinition {
                id,
                name,
                description,
                emoji,
                rule,
            }
        }

        let definitions = vec![
            def("first_log", "First Steps", "Complete your first workout", "🎯", Rule::FirstSession),
            def("first_push", "Push Master", "Complete your first Push workout", "💪", Rule::FirstOfCategory(WorkoutCategory::Push)),
            def("first_pull", "Pull Expert", "Complete your first Pull workout", "🏋️", Rule::FirstOfCategory(WorkoutCategory::Pull)),
            def("first_legs", "Leg Day Champion", "Complete your first Legs workout", "🦵", Rule::FirstOfCategory(WorkoutCategory::Legs)),
            def("perfect_log", "Perfectionist", "Log a workout with every field filled in", "✨", Rule::PerfectLog),
            def("seven_days", "Week Warrior", "Train 7 days in a row", "📅", Rule::DayStreak(7)),
            def("weight_increase", "Getting Stronger", "Increase the weight of any exercise by the target percentage", "📈", Rule::WeightIncrease { percent: config.weight_increase_percent }),
            def("max_effort", "All Out", "Record a perceived effort of 10", "🔥", Rule::MaxEffort),
            def("score_improvement", "Score Chaser", "Beat your previous Oshfit score", "🏆", Rule::ScoreImprovement),
            def("consistency", "Consistency King", "Train 30 days in a row", "👑", Rule::DayStreak(30)),
            def("early_bird", "Early Bird", "Finish a workout early in the morning", "🌅", Rule::EarlyBird { before_hour: config.early_bird_hour }),
            def("night_owl", "Night Owl", "Finish a workout late in the evening", "🦉", Rule::NightOwl { from_hour: config.night_owl_hour }),
            def("iron_marathon", "Iron Marathon", "Train for more than 90 minutes", "⏱️", Rule::LongSession { minutes: 90 }),
            def("extreme_efficiency", "Extreme Efficiency", "A high-effort workout in under 45 minutes", "⚡", Rule::EfficientSession { max_minutes: 45, min_avg_effort: 8.0 }),
            def("triple_crown", "Triple Crown", "Push, Pull and Legs in the same week", "👑", Rule::TripleCrown),
            def("consistency_artist", "Consistency Artist", "Train on the same weekday 4 weeks in a row", "🎨", Rule::SameWeekdayStreak(4)),
            def("volume_master", "Volume Master", "Move the target volume in a single workout", "📊", Rule::SessionVolume { kg: config.volume_target_kg }),
            def("multifaceted", "Multifaceted", "At least 8 different exercises in one workout", "🔄", Rule::DistinctExercises(8)),
            def("experimenter", "Experimenter", "Use every exercise alternative at least once", "🧪", Rule::AlternativeCoverage),
            def("personal_best", "Personal Best", "Raise the weight of an exercise 5 weeks in a row", "🚀", Rule::WeeklyIncreaseStreak(5)),
            def("weekend_warrior", "Weekend Warrior", "Train on the weekend 4 weeks in a row", "🗓️", Rule::WeekendStreak(4)),
            def("heavy_lifter", "Heavy Lifter", "Lift the target weight in a single exercise", "🦍", Rule::HeavyLift { kg: config.heavy_lift_kg }),
        ];

        AchievementCatalog { definitions }
    }

    pub fn get(&self, id: &str) -> Option<&AchievementDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Validate the catalog for consistency
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for def in &self.definitions {
            if def.id.trim().is_empty() {
                errors.push("Achievement has empty ID".to_string());
                continue;
            }
            if !seen.insert(def.id) {
                errors.push(format!("Duplicate achievement ID '{}'", def.id));
            }
            if def.name.is_empty() {
                errors.push(format!("Achievement '{}' has empty name", def.id));
            }
            if let Some(problem) = def.rule.threshold_error() {
                errors.push(format!("Achievement '{}': {}", def.id, problem));
            }
        }

        errors
    }
}

/// Cached default achievement catalog
static DEFAULT_ACHIEVEMENTS: Lazy<AchievementCatalog> =
    Lazy::new(|| AchievementCatalog::from_config(&AchievementConfig::default()));

/// Get a reference to the cached default achievement catalog
pub fn default_achievement_catalog() -> &'static AchievementCatalog {
    &DEFAULT_ACHIEVEMENTS
}
