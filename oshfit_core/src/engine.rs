//! Achievement evaluation engine.
//!
//! Every pass recomputes each locked achievement from the full session
//! history:
//! - Unlocked achievements are terminal and returned untouched
//! - Satisfied rules unlock at the supplied `now`
//! - Everything else gets a fresh progress fraction in [0, 1]

use crate::catalog::{AchievementCatalog, ExerciseCatalog, Rule};
use crate::progression::{max_percent_increase_across_exercises, max_weekly_increase_streak};
use crate::score::score_improved;
use crate::temporal::{
    consecutive_same_weekday_count, consecutive_weekend_count, iso_week_start,
    longest_consecutive_day_streak,
};
use crate::{
    chronological, AchievementState, AchievementStatus, CountProgress, Error, Result, Session,
    UserHistory, WorkoutCategory,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use uuid::Uuid;

/// How far one rule is from being met
#[derive(Clone, Debug, PartialEq)]
pub struct Assessment {
    pub satisfied: bool,
    pub progress: f64,
    pub count: Option<CountProgress>,
}

/// `value / target` clamped to [0, 1]; 0 for a non-positive target or a non-finite value
fn ratio(value: f64, target: f64) -> f64 {
    if !(target > 0.0) || !value.is_finite() {
        return 0.0;
    }
    (value / target).clamp(0.0, 1.0)
}

impl Assessment {
    pub fn binary(satisfied: bool) -> Self {
        Self {
            satisfied,
            progress: if satisfied { 1.0 } else { 0.0 },
            count: None,
        }
    }

    /// Partial credit for an unmet condition
    fn tiered(satisfied: bool, partial: f64) -> Self {
        Self {
            satisfied,
            progress: if satisfied { 1.0 } else { partial.clamp(0.0, 1.0) },
            count: None,
        }
    }

    pub fn fraction(value: f64, target: f64) -> Self {
        let satisfied = target > 0.0 && value >= target;
        Self {
            satisfied,
            progress: ratio(value, target),
            count: None,
        }
    }

    pub fn counted(current: u32, required: u32) -> Self {
        let satisfied = required > 0 && current >= required;
        Self {
            satisfied,
            progress: ratio(f64::from(current), f64::from(required)),
            count: Some(CountProgress { current, required }),
        }
    }
}

/// Everything a rule may look at
#[derive(Clone, Copy, Debug)]
pub struct HistoryView<'a> {
    pub sessions: &'a [Session],
    pub exercises: &'a ExerciseCatalog,
}

/// Evaluate one rule against the history
pub fn assess(rule: &Rule, view: HistoryView<'_>) -> Assessment {
    let sessions = view.sessions;

    match rule {
        Rule::FirstSession => Assessment::binary(!sessions.is_empty()),

        Rule::FirstOfCategory(category) => {
            Assessment::binary(sessions.iter().any(|s| s.category == *category))
        }

        Rule::PerfectLog => Assessment::binary(sessions.iter().any(|s| {
            !s.exercises.is_empty() && s.exercises.iter().all(|e| e.is_complete())
        })),

        Rule::DayStreak(n) => Assessment::counted(longest_consecutive_day_streak(sessions), *n),

        Rule::WeekendStreak(n) => Assessment::counted(consecutive_weekend_count(sessions), *n),

        Rule::SameWeekdayStreak(n) => {
            Assessment::counted(consecutive_same_weekday_count(sessions), *n)
        }

        Rule::WeightIncrease { percent } => {
            Assessment::fraction(max_percent_increase_across_exercises(sessions), *percent)
        }

        Rule::MaxEffort => {
            let max_effort = all_records(sessions).map(|e| e.effort).max().unwrap_or(0);
            Assessment::fraction(f64::from(max_effort), 10.0)
        }

        Rule::HeavyLift { kg } => {
            let heaviest = all_records(sessions)
                .map(|e| e.kg_weight())
                .fold(0.0, f64::max);
            Assessment::fraction(heaviest, *kg)
        }

        Rule::SessionVolume { kg } => {
            let biggest = sessions.iter().map(Session::volume_kg).fold(0.0, f64::max);
            Assessment::fraction(biggest, *kg)
        }

        Rule::DistinctExercises(n) => {
            let most = sessions
                .iter()
                .map(|s| {
                    s.exercises
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<HashSet<_>>()
                        .len() as u32
                })
                .max()
                .unwrap_or(0);
            Assessment::counted(most, *n)
        }

        Rule::TripleCrown => assess_triple_crown(sessions),

        Rule::EarlyBird { before_hour } => Assessment::binary(
            sessions
                .iter()
                .filter_map(Session::local_hour)
                .any(|hour| hour < *before_hour),
        ),

        Rule::NightOwl { from_hour } => Assessment::binary(
            sessions
                .iter()
                .filter_map(Session::local_hour)
                .any(|hour| hour >= *from_hour),
        ),

        Rule::LongSession { minutes } => assess_long_session(sessions, *minutes),

        Rule::EfficientSession {
            max_minutes,
            min_avg_effort,
        } => assess_efficient_session(sessions, *max_minutes, *min_avg_effort),

        Rule::AlternativeCoverage => assess_alternative_coverage(view),

        Rule::WeeklyIncreaseStreak(n) => {
            Assessment::counted(max_weekly_increase_streak(sessions), *n)
        }

        Rule::ScoreImprovement => Assessment::binary(score_improved(sessions)),
    }
}

fn all_records(sessions: &[Session]) -> impl Iterator<Item = &crate::ExerciseRecord> {
    sessions.iter().flat_map(|s| s.exercises.iter())
}

/// Known durations only; 0 and absent mean "not recorded"
fn recorded_duration(session: &Session) -> Option<u32> {
    session.duration_minutes.filter(|d| *d > 0)
}

fn assess_triple_crown(sessions: &[Session]) -> Assessment {
    let mut weeks: BTreeMap<NaiveDate, BTreeSet<WorkoutCategory>> = BTreeMap::new();
    for session in sessions {
        weeks
            .entry(iso_week_start(session.local_date()))
            .or_default()
            .insert(session.category);
    }

    let satisfied = weeks
        .values()
        .any(|categories| categories.len() == WorkoutCategory::ALL.len());

    let current_week = chronological(sessions)
        .last()
        .and_then(|latest| weeks.get(&iso_week_start(latest.local_date())))
        .map_or(0, BTreeSet::len);

    Assessment::tiered(
        satisfied,
        ratio(current_week as f64, WorkoutCategory::ALL.len() as f64),
    )
}

fn assess_long_session(sessions: &[Session], minutes: u32) -> Assessment {
    let Some(longest) = sessions.iter().filter_map(recorded_duration).max() else {
        return Assessment::binary(false);
    };

    let (d, m) = (u64::from(longest), u64::from(minutes));
    let partial = if d * 9 >= m * 8 {
        0.8
    } else if d * 3 >= m * 2 {
        0.6
    } else if d * 3 >= m {
        0.3
    } else {
        0.0
    };

    Assessment::tiered(longest > minutes, partial)
}

fn assess_efficient_session(sessions: &[Session], max_minutes: u32, min_avg_effort: f64) -> Assessment {
    let mut satisfied = false;
    let mut partial: f64 = 0.0;

    for session in sessions {
        let Some(duration) = recorded_duration(session) else {
            continue;
        };
        let effort = session.average_effort();
        let under_limit = duration < max_minutes;

        if under_limit && effort > min_avg_effort {
            satisfied = true;
            break;
        }

        let tier = if under_limit && effort >= min_avg_effort - 1.0 {
            0.8
        } else if effort > min_avg_effort && duration < max_minutes.saturating_add(15) {
            0.6
        } else if under_limit {
            0.3
        } else {
            0.0
        };
        partial = partial.max(tier);
    }

    Assessment::tiered(satisfied, partial)
}

fn assess_alternative_coverage(view: HistoryView<'_>) -> Assessment {
    let records: Vec<_> = all_records(view.sessions).collect();

    let total = view.exercises.exercises.len() as u32;
    let used = view
        .exercises
        .exercises
        .iter()
        .filter(|exercise| {
            records.iter().any(|record| {
                exercise.alternative.matches(&record.name)
                    || (record.use_alternative && exercise.matches(&record.name))
            })
        })
        .count() as u32;

    Assessment::counted(used, total)
}

/// Result of one evaluation pass
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Catalog order, followed by states whose id the catalog does not know
    pub states: Vec<AchievementState>,
    /// Ids unlocked by this pass
    pub newly_unlocked: Vec<String>,
}

/// All-locked initial states for a catalog
pub fn provision(catalog: &AchievementCatalog) -> Vec<AchievementState> {
    catalog
        .definitions
        .iter()
        .map(|def| AchievementState::locked(def.id))
        .collect()
}

/// Re-evaluate every achievement of a user against their full history
pub fn evaluate(
    catalog: &AchievementCatalog,
    exercises: &ExerciseCatalog,
    states: &[AchievementState],
    sessions: &[Session],
    now: DateTime<Utc>,
) -> Evaluation {
    // Duplicate ids collapse to one state, an unlocked copy winning
    let mut existing: HashMap<&str, &AchievementState> = HashMap::new();
    for state in states {
        existing
            .entry(state.id.as_str())
            .and_modify(|kept| {
                if !kept.is_unlocked() && state.is_unlocked() {
                    *kept = state;
                }
            })
            .or_insert(state);
    }

    let view = HistoryView {
        sessions,
        exercises,
    };
    let mut evaluated = Vec::with_capacity(catalog.definitions.len());
    let mut newly_unlocked = Vec::new();

    for def in &catalog.definitions {
        if let Some(state) = existing.get(def.id).filter(|s| s.is_unlocked()) {
            evaluated.push((*state).clone());
            continue;
        }

        let assessment = assess(&def.rule, view);
        tracing::debug!(
            "Achievement {}: satisfied={} progress={:.3}",
            def.id,
            assessment.satisfied,
            assessment.progress
        );

        let (status, progress) = if assessment.satisfied {
            tracing::info!("Unlocked achievement {} ({})", def.id, def.name);
            newly_unlocked.push(def.id.to_string());
            (AchievementStatus::Unlocked { at: now }, 1.0)
        } else {
            (AchievementStatus::Locked, assessment.progress)
        };

        evaluated.push(AchievementState {
            id: def.id.to_string(),
            status,
            progress,
            count: assessment.count,
        });
    }

    let mut carried = HashSet::new();
    for state in states {
        let id = state.id.as_str();
        if catalog.contains(id) || !carried.insert(id) {
            continue;
        }
        tracing::debug!("Carrying state for unknown achievement {}", id);
        if let Some(kept) = existing.get(id) {
            evaluated.push((*kept).clone());
        }
    }

    Evaluation {
        states: evaluated,
        newly_unlocked,
    }
}

/// Re-evaluate after `session_id` was logged or edited.
///
/// The session must already be part of `sessions`.
pub fn evaluate_session(
    catalog: &AchievementCatalog,
    exercises: &ExerciseCatalog,
    states: &[AchievementState],
    sessions: &[Session],
    session_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Evaluation> {
    if !sessions.iter().any(|s| s.id == session_id) {
        return Err(Error::SessionNotInHistory(session_id));
    }

    tracing::debug!("Evaluating achievements for session {}", session_id);
    Ok(evaluate(catalog, exercises, states, sessions, now))
}

impl UserHistory {
    /// Re-evaluate in place, returning the ids unlocked by this pass
    pub fn evaluate(
        &mut self,
        catalog: &AchievementCatalog,
        exercises: &ExerciseCatalog,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let evaluation = evaluate(catalog, exercises, &self.achievements, &self.sessions, now);
        self.achievements = evaluation.states;
        evaluation.newly_unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_achievement_catalog, default_exercise_catalog};
    use crate::progression::tests::lift;
    use crate::temporal::tests::session_at;
    use crate::{ExerciseRecord, WeightUnit};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn session(timestamp: &str, category: WorkoutCategory, records: Vec<ExerciseRecord>) -> Session {
        let mut s = session_at(timestamp, category);
        s.exercises = records;
        s
    }

    fn run(sessions: &[Session], states: &[AchievementState]) -> Evaluation {
        evaluate(
            default_achievement_catalog(),
            default_exercise_catalog(),
            states,
            sessions,
            now(),
        )
    }

    fn state<'a>(evaluation: &'a Evaluation, id: &str) -> &'a AchievementState {
        evaluation
            .states
            .iter()
            .find(|s| s.id == id)
            .unwrap_or_else(|| panic!("no state for {}", id))
    }

    fn assess_default(id: &str, sessions: &[Session]) -> Assessment {
        let def = default_achievement_catalog().get(id).unwrap();
        assess(
            &def.rule,
            HistoryView {
                sessions,
                exercises: default_exercise_catalog(),
            },
        )
    }

    #[test]
    fn test_provision_all_locked() {
        let states = provision(default_achievement_catalog());
        assert_eq!(states.len(), 22);
        assert!(states.iter().all(|s| !s.is_unlocked() && s.progress == 0.0));
    }

    #[test]
    fn test_empty_history_unlocks_nothing() {
        let evaluation = run(&[], &[]);
        assert!(evaluation.newly_unlocked.is_empty());
        assert_eq!(evaluation.states.len(), 22);
        for s in &evaluation.states {
            assert!(!s.is_unlocked());
            assert_eq!(s.progress, 0.0, "{} has progress", s.id);
        }
    }

    #[test]
    fn test_first_session_unlocks() {
        let sessions = vec![session(
            "2024-05-01T10:00:00Z",
            WorkoutCategory::Push,
            vec![lift("benchpress", 60.0, WeightUnit::Kg)],
        )];
        let evaluation = run(&sessions, &[]);

        assert!(evaluation.newly_unlocked.contains(&"first_log".to_string()));
        assert!(evaluation.newly_unlocked.contains(&"first_push".to_string()));
        assert!(!state(&evaluation, "first_pull").is_unlocked());
        assert_eq!(state(&evaluation, "first_log").unlocked_at(), Some(now()));
    }

    #[test]
    fn test_unlock_is_monotonic() {
        let sessions = vec![session("2024-05-01T10:00:00Z", WorkoutCategory::Legs, vec![])];
        let first = run(&sessions, &[]);
        assert!(state(&first, "first_legs").is_unlocked());

        // History emptied (session deleted): the achievement stays unlocked
        let later = evaluate(
            default_achievement_catalog(),
            default_exercise_catalog(),
            &first.states,
            &[],
            now() + chrono::Duration::days(3),
        );
        let legs = state(&later, "first_legs");
        assert!(legs.is_unlocked());
        assert_eq!(legs.unlocked_at(), Some(now()));
        assert!(later.newly_unlocked.is_empty());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        crate::logging::init_test();
        let sessions = vec![
            session("2024-05-01T06:30:00Z", WorkoutCategory::Push, vec![lift("benchpress", 60.0, WeightUnit::Kg)]),
            session("2024-05-02T22:00:00Z", WorkoutCategory::Pull, vec![lift("deadlift", 120.0, WeightUnit::Kg)]),
        ];
        let first = run(&sessions, &[]);
        let second = run(&sessions, &first.states);

        assert_eq!(first.states, second.states);
        assert!(second.newly_unlocked.is_empty());
    }

    #[test]
    fn test_day_streak_progress() {
        let sessions: Vec<_> = ["2024-01-01", "2024-01-02", "2024-01-04"]
            .iter()
            .map(|d| session(&format!("{}T10:00:00Z", d), WorkoutCategory::Push, vec![]))
            .collect();
        let evaluation = run(&sessions, &[]);

        let seven = state(&evaluation, "seven_days");
        assert!(!seven.is_unlocked());
        assert_eq!(seven.count, Some(CountProgress { current: 2, required: 7 }));
        assert!((seven.progress - 2.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_increase_progress_is_capped() {
        let half_way = vec![
            session("2024-05-01T10:00:00Z", WorkoutCategory::Push, vec![lift("benchpress", 100.0, WeightUnit::Kg)]),
            session("2024-05-08T10:00:00Z", WorkoutCategory::Push, vec![lift("benchpress", 102.5, WeightUnit::Kg)]),
        ];
        let a = assess_default("weight_increase", &half_way);
        assert!(!a.satisfied);
        assert!((a.progress - 0.5).abs() < 1e-9);

        let doubled = vec![
            session("2024-05-01T10:00:00Z", WorkoutCategory::Push, vec![lift("benchpress", 100.0, WeightUnit::Kg)]),
            session("2024-05-08T10:00:00Z", WorkoutCategory::Push, vec![lift("benchpress", 200.0, WeightUnit::Kg)]),
        ];
        let a = assess_default("weight_increase", &doubled);
        assert!(a.satisfied);
        assert_eq!(a.progress, 1.0);
    }

    #[test]
    fn test_heavy_lift_is_unit_invariant() {
        // 225 lb is just over 102 kg
        let sessions = vec![session(
            "2024-05-01T10:00:00Z",
            WorkoutCategory::Pull,
            vec![lift("deadlift", 225.0, WeightUnit::Lb)],
        )];
        assert!(assess_default("heavy_lifter", &sessions).satisfied);

        let sessions = vec![session(
            "2024-05-01T10:00:00Z",
            WorkoutCategory::Pull,
            vec![lift("deadlift", 200.0, WeightUnit::Lb)],
        )];
        let a = assess_default("heavy_lifter", &sessions);
        assert!(!a.satisfied);
        assert!(a.progress > 0.9 && a.progress < 1.0);
    }

    #[test]
    fn test_volume_master_counts_bar() {
        let mut squat = lift("squats", 80.0, WeightUnit::Kg);
        squat.sets = 10;
        squat.reps_per_set = 10;
        // 80 × 100 = 8000 kg without the bar
        let a = assess_default("volume_master", &[session("2024-05-01T10:00:00Z", WorkoutCategory::Legs, vec![squat.clone()])]);
        assert!(!a.satisfied);
        assert!((a.progress - 0.8).abs() < 1e-9);

        squat.bar_weight = 20.0;
        squat.include_bar_weight = true;
        let a = assess_default("volume_master", &[session("2024-05-01T10:00:00Z", WorkoutCategory::Legs, vec![squat])]);
        assert!(a.satisfied);
    }

    #[test]
    fn test_unlocked_states_have_full_progress() {
        // Volume overflows to infinity: satisfied, but its ratio is not finite
        let mut squat = lift("squats", 1e300, WeightUnit::Kg);
        squat.sets = u32::MAX;
        squat.reps_per_set = u32::MAX;
        let sessions = vec![session("2024-05-01T10:00:00Z", WorkoutCategory::Legs, vec![squat])];

        let evaluation = run(&sessions, &[]);
        assert!(evaluation.newly_unlocked.contains(&"volume_master".to_string()));
        for id in &evaluation.newly_unlocked {
            assert_eq!(state(&evaluation, id).progress, 1.0, "{} unlocked below 1", id);
        }
        for s in evaluation.states.iter().filter(|s| s.is_unlocked()) {
            assert_eq!(s.progress, 1.0);
        }
    }

    #[test]
    fn test_perfect_log_and_max_effort() {
        let mut partial = lift("benchpress", 60.0, WeightUnit::Kg);
        partial.effort = 0;
        let sessions = vec![session("2024-05-01T10:00:00Z", WorkoutCategory::Push, vec![lift("dips", 10.0, WeightUnit::Kg), partial])];
        assert!(!assess_default("perfect_log", &sessions).satisfied);
        assert!(!assess_default("perfect_log", &[session("2024-05-01T10:00:00Z", WorkoutCategory::Push, vec![])]).satisfied);

        let mut all_out = lift("benchpress", 60.0, WeightUnit::Kg);
        all_out.effort = 10;
        let sessions = vec![session("2024-05-02T10:00:00Z", WorkoutCategory::Push, vec![all_out])];
        assert!(assess_default("perfect_log", &sessions).satisfied);
        assert!(assess_default("max_effort", &sessions).satisfied);
    }

    #[test]
    fn test_triple_crown() {
        // Monday, Wednesday, Friday of one ISO week
        let sessions = vec![
            session("2024-05-06T10:00:00Z", WorkoutCategory::Push, vec![]),
            session("2024-05-08T10:00:00Z", WorkoutCategory::Pull, vec![]),
            session("2024-05-10T10:00:00Z", WorkoutCategory::Legs, vec![]),
        ];
        assert!(assess_default("triple_crown", &sessions).satisfied);

        // Split over two weeks: the latest week holds one category
        let sessions = vec![
            session("2024-05-06T10:00:00Z", WorkoutCategory::Push, vec![]),
            session("2024-05-08T10:00:00Z", WorkoutCategory::Pull, vec![]),
            session("2024-05-13T10:00:00Z", WorkoutCategory::Legs, vec![]),
        ];
        let a = assess_default("triple_crown", &sessions);
        assert!(!a.satisfied);
        assert!((a.progress - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_of_day_rules() {
        let early = vec![session("2024-05-01T07:15:00+02:00", WorkoutCategory::Push, vec![])];
        assert!(assess_default("early_bird", &early).satisfied);
        assert!(!assess_default("night_owl", &early).satisfied);

        let late = vec![session("2024-05-01T21:00:00-04:00", WorkoutCategory::Push, vec![])];
        assert!(assess_default("night_owl", &late).satisfied);
        assert!(!assess_default("early_bird", &late).satisfied);

        // Date-only records carry no time of day
        let mut undated = session_at("2024-05-01T00:00:00Z", WorkoutCategory::Push);
        undated.time_recorded = false;
        assert!(!assess_default("early_bird", &[undated]).satisfied);
    }

    fn with_duration(minutes: Option<u32>, effort: u8) -> Session {
        let mut record = lift("benchpress", 60.0, WeightUnit::Kg);
        record.effort = effort;
        let mut s = session("2024-05-01T10:00:00Z", WorkoutCategory::Push, vec![record]);
        s.duration_minutes = minutes;
        s
    }

    #[test]
    fn test_long_session_tiers() {
        let progress = |m| assess_default("iron_marathon", &[with_duration(m, 5)]);

        assert_eq!(progress(None).progress, 0.0);
        assert_eq!(progress(Some(0)).progress, 0.0);
        assert_eq!(progress(Some(29)).progress, 0.0);
        assert_eq!(progress(Some(30)).progress, 0.3);
        assert_eq!(progress(Some(60)).progress, 0.6);
        assert_eq!(progress(Some(80)).progress, 0.8);

        let exactly = progress(Some(90));
        assert!(!exactly.satisfied);
        assert_eq!(exactly.progress, 0.8);
        assert!(progress(Some(91)).satisfied);
    }

    #[test]
    fn test_efficiency_tiers() {
        let assessed = |m, effort| assess_default("extreme_efficiency", &[with_duration(m, effort)]);

        assert!(assessed(Some(40), 9).satisfied);
        assert!(!assessed(Some(40), 8).satisfied);
        assert_eq!(assessed(Some(40), 8).progress, 0.8);
        assert_eq!(assessed(Some(55), 9).progress, 0.6);
        assert_eq!(assessed(Some(40), 3).progress, 0.3);
        assert_eq!(assessed(Some(70), 9).progress, 0.0);
        assert_eq!(assessed(None, 10).progress, 0.0);
    }

    #[test]
    fn test_alternative_coverage_all_but_one() {
        let catalog = default_exercise_catalog();
        let total = catalog.exercises.len() as u32;

        let records: Vec<_> = catalog
            .alternatives()
            .skip(1)
            .map(|alt| lift(&alt.name, 20.0, WeightUnit::Kg))
            .collect();
        let sessions = vec![session("2024-05-01T10:00:00Z", WorkoutCategory::Push, records)];

        let a = assess_default("experimenter", &sessions);
        assert!(!a.satisfied);
        assert_eq!(a.count, Some(CountProgress { current: total - 1, required: total }));
        assert!((a.progress - f64::from(total - 1) / f64::from(total)).abs() < 1e-9);

        // The missing one logged as the primary with the alternative flag
        let mut flagged = lift("benchpress", 20.0, WeightUnit::Kg);
        flagged.use_alternative = true;
        let mut completed = sessions.clone();
        completed.push(session("2024-05-02T10:00:00Z", WorkoutCategory::Push, vec![flagged]));
        assert!(assess_default("experimenter", &completed).satisfied);
    }

    #[test]
    fn test_alternative_coverage_empty_catalog() {
        let empty = ExerciseCatalog::default();
        let a = assess(
            &Rule::AlternativeCoverage,
            HistoryView {
                sessions: &[],
                exercises: &empty,
            },
        );
        assert!(!a.satisfied);
        assert_eq!(a.progress, 0.0);
    }

    #[test]
    fn test_multifaceted_counts_distinct_names() {
        let records: Vec<_> = (0..8)
            .map(|i| lift(&format!("exercise-{}", i % 7), 10.0, WeightUnit::Kg))
            .collect();
        let a = assess_default("multifaceted", &[session("2024-05-01T10:00:00Z", WorkoutCategory::Push, records)]);
        assert_eq!(a.count, Some(CountProgress { current: 7, required: 8 }));
    }

    #[test]
    fn test_unknown_and_duplicate_states() {
        let unlocked = AchievementState {
            id: "first_pull".into(),
            status: AchievementStatus::Unlocked { at: now() - chrono::Duration::days(30) },
            progress: 1.0,
            count: None,
        };
        let retired = AchievementState {
            id: "retired_badge".into(),
            status: AchievementStatus::Locked,
            progress: 0.4,
            count: None,
        };
        let states = vec![
            AchievementState::locked("first_pull"),
            retired.clone(),
            unlocked.clone(),
        ];

        let evaluation = run(&[], &states);
        assert_eq!(state(&evaluation, "first_pull"), &unlocked);
        assert_eq!(evaluation.states.last(), Some(&retired));
        assert_eq!(evaluation.states.len(), 23);
    }

    #[test]
    fn test_evaluate_session_requires_membership() {
        let s = session("2024-05-01T10:00:00Z", WorkoutCategory::Push, vec![]);
        let missing = Uuid::new_v4();

        let err = evaluate_session(
            default_achievement_catalog(),
            default_exercise_catalog(),
            &[],
            std::slice::from_ref(&s),
            missing,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SessionNotInHistory(id) if id == missing));

        let ok = evaluate_session(
            default_achievement_catalog(),
            default_exercise_catalog(),
            &[],
            std::slice::from_ref(&s),
            s.id,
            now(),
        )
        .unwrap();
        assert!(ok.newly_unlocked.contains(&"first_log".to_string()));
    }

    #[test]
    fn test_user_history_evaluate() {
        let mut history = UserHistory {
            sessions: vec![session("2024-05-01T10:00:00Z", WorkoutCategory::Pull, vec![])],
            achievements: vec![],
        };
        let unlocked = history.evaluate(default_achievement_catalog(), default_exercise_catalog(), now());
        assert_eq!(unlocked, vec!["first_log".to_string(), "first_pull".to_string()]);
        assert_eq!(history.achievements.len(), 22);
    }
}
