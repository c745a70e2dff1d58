//! Normalization of stored workout records.
//!
//! Sessions have been stored in several shapes over time: exercises as a
//! list of numeric records, or as a map keyed by exercise name whose values
//! are all strings. Everything funnels through here into the canonical
//! [`Session`] / [`ExerciseRecord`] types; nothing downstream looks at the
//! stored shape again.

use crate::{Error, ExerciseRecord, Result, Session, WeightUnit, WorkoutCategory};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Pounds to kilograms
pub const KG_PER_LB: f64 = 0.45359237;

/// Convert a weight to kilograms.
///
/// Every component converts through this function. Non-finite input yields 0.
pub fn to_kilograms(weight: f64, unit: WeightUnit) -> f64 {
    if !weight.is_finite() {
        return 0.0;
    }
    match unit {
        WeightUnit::Kg => weight,
        WeightUnit::Lb => weight * KG_PER_LB,
    }
}

// ============================================================================
// Raw (stored) shapes
// ============================================================================

/// A scalar that older records stored as a string
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Loose {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl Loose {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Loose::Number(n) => *n,
            Loose::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
            Loose::Flag(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    fn as_bool(&self) -> bool {
        match self {
            Loose::Flag(b) => *b,
            Loose::Number(n) => *n != 0.0,
            Loose::Text(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        }
    }
}

/// Read a field leniently: a value of the wrong shape counts as missing
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// An exercise record as stored, every field optional
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExercise {
    #[serde(default, deserialize_with = "lenient", alias = "name")]
    pub exercise_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub weight: Option<Loose>,
    #[serde(default, deserialize_with = "lenient", alias = "unit")]
    pub weight_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub sets: Option<Loose>,
    #[serde(default, deserialize_with = "lenient")]
    pub reps_per_set: Option<Loose>,
    /// Legacy single repetition field
    #[serde(default, deserialize_with = "lenient")]
    pub reps: Option<Loose>,
    #[serde(default, deserialize_with = "lenient")]
    pub bar_weight: Option<Loose>,
    #[serde(default, deserialize_with = "lenient")]
    pub include_bar_weight: Option<Loose>,
    #[serde(default, deserialize_with = "lenient", alias = "effort")]
    pub perceived_effort: Option<Loose>,
    #[serde(default, deserialize_with = "lenient")]
    pub use_alternative: Option<Loose>,
}

/// A session as stored.
///
/// `exercises` stays untyped: it is either a list of records or, in the
/// legacy layout, a map keyed by exercise name, and each entry is
/// normalized on its own.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSession {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", alias = "performedAt")]
    pub date: Option<String>,
    /// Legacy `HH:MM` companion of a date-only `date`
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient", alias = "type")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub body_weight: Option<Loose>,
    #[serde(default, deserialize_with = "lenient")]
    pub body_weight_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient", alias = "durationMinutes")]
    pub duration: Option<Loose>,
    #[serde(default, deserialize_with = "lenient")]
    pub cardio_after: Option<Loose>,
    #[serde(default, deserialize_with = "lenient")]
    pub cardio_minutes: Option<Loose>,
    #[serde(default)]
    pub exercises: Option<Value>,
}

// ============================================================================
// Exercise normalization
// ============================================================================

fn non_negative(value: Option<&Loose>) -> Option<f64> {
    value.and_then(Loose::as_f64).map(|v| v.max(0.0))
}

fn count(value: Option<&Loose>) -> Option<u32> {
    non_negative(value).map(|v| v.round().min(f64::from(u32::MAX)) as u32)
}

fn unit_or_kg(label: Option<&str>) -> WeightUnit {
    match label {
        Some(label) => WeightUnit::parse(label).unwrap_or_else(|| {
            tracing::debug!("Unknown weight unit {:?}, assuming kg", label);
            WeightUnit::Kg
        }),
        None => WeightUnit::Kg,
    }
}

/// Turn a possibly partial stored record into a fully populated one.
///
/// Defaults: unit kg, one set, no bar weight, effort 0. Reps per set fall back
/// to the legacy `reps` field, divided by the set count when one was given.
/// A `None` record becomes [`ExerciseRecord::zero`].
pub fn normalize_exercise(raw: Option<&RawExercise>) -> ExerciseRecord {
    let Some(raw) = raw else {
        return ExerciseRecord::zero();
    };

    let name = raw
        .exercise_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let supplied_sets = count(raw.sets.as_ref());
    let legacy_reps = count(raw.reps.as_ref());

    let reps_per_set = match count(raw.reps_per_set.as_ref()) {
        Some(reps) => reps,
        None => match (supplied_sets, legacy_reps) {
            (Some(sets), Some(total)) if sets > 0 => {
                (f64::from(total) / f64::from(sets)).round() as u32
            }
            (_, Some(total)) => total,
            _ => 0,
        },
    };

    let mut sets = supplied_sets.unwrap_or(1);
    if sets == 0 && legacy_reps.unwrap_or(0) > 0 {
        sets = 1;
    }

    let effort = non_negative(raw.perceived_effort.as_ref())
        .map(|e| e.min(10.0).round() as u8)
        .unwrap_or(0);

    ExerciseRecord {
        name,
        weight: non_negative(raw.weight.as_ref()).unwrap_or(0.0),
        unit: unit_or_kg(raw.weight_unit.as_deref()),
        sets,
        reps_per_set,
        bar_weight: non_negative(raw.bar_weight.as_ref()).unwrap_or(0.0),
        include_bar_weight: raw
            .include_bar_weight
            .as_ref()
            .map(Loose::as_bool)
            .unwrap_or(false),
        effort,
        use_alternative: raw
            .use_alternative
            .as_ref()
            .map(Loose::as_bool)
            .unwrap_or(false),
    }
}

/// One stored exercise entry; anything but an object is no record at all
fn raw_exercise(value: &Value) -> Option<RawExercise> {
    match value {
        Value::Object(_) => RawExercise::deserialize(value).ok(),
        Value::Null => None,
        other => {
            tracing::debug!("Exercise entry {} is not a record, using the zero record", other);
            None
        }
    }
}

/// Normalize whichever exercise layout a session was stored with
pub fn normalize_exercises(raw: Option<&Value>) -> Vec<ExerciseRecord> {
    match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| normalize_exercise(raw_exercise(entry).as_ref()))
            .collect(),
        // Legacy layout keyed by exercise name
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(key, entry)| {
                let raw = raw_exercise(entry);
                let mut record = normalize_exercise(raw.as_ref());
                let unnamed = raw
                    .as_ref()
                    .and_then(|r| r.exercise_name.as_deref())
                    .map_or(true, |n| n.trim().is_empty());
                if unnamed && !key.trim().is_empty() {
                    record.name = key.trim().to_string();
                }
                record
            })
            .collect(),
        Some(other) => {
            tracing::warn!("Unreadable exercise collection {}, treating it as empty", other);
            Vec::new()
        }
    }
}

// ============================================================================
// Session normalization
// ============================================================================

/// Map a stored id onto a [`Uuid`].
///
/// Ids that are not UUIDs (document-store object ids, for instance) map to a
/// stable v5 UUID so the same record always gets the same id.
pub fn session_id_from_raw(raw: &str) -> Uuid {
    let raw = raw.trim();
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes()))
}

/// Parse a stored session date.
///
/// Returns the timestamp and whether it carried a time of day. Naive values
/// are read as UTC.
pub fn parse_performed_at(
    date: &str,
    time: Option<&str>,
) -> Option<(DateTime<FixedOffset>, bool)> {
    let date = date.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some((dt, true));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(date, format) {
            return Some((naive.and_utc().fixed_offset(), true));
        }
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time_of_day = time.and_then(|t| {
        let t = t.trim();
        NaiveTime::parse_from_str(t, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M:%S"))
            .ok()
    });

    let recorded = time_of_day.is_some();
    let naive = day.and_time(time_of_day.unwrap_or_default());
    Some((naive.and_utc().fixed_offset(), recorded))
}

/// Stable id for a stored session that never had one, derived from its contents
fn content_id(raw: &RawSession) -> Result<Uuid> {
    let canonical = serde_json::to_vec(raw)?;
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &canonical))
}

impl TryFrom<RawSession> for Session {
    type Error = Error;

    fn try_from(raw: RawSession) -> Result<Self> {
        Session::try_from(&raw)
    }
}

impl TryFrom<&RawSession> for Session {
    type Error = Error;

    fn try_from(raw: &RawSession) -> Result<Self> {
        let date = raw
            .date
            .as_deref()
            .ok_or_else(|| Error::InvalidSession("missing date".into()))?;

        let (performed_at, time_recorded) = parse_performed_at(date, raw.time.as_deref())
            .ok_or_else(|| Error::InvalidSession(format!("unparseable date {:?}", date)))?;

        let category = raw
            .category
            .as_deref()
            .ok_or_else(|| Error::InvalidSession("missing workout category".into()))?;
        let category = WorkoutCategory::parse(category).ok_or_else(|| {
            Error::InvalidSession(format!("unknown workout category {:?}", category))
        })?;

        let id = match raw.id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => session_id_from_raw(id),
            None => {
                let id = content_id(raw)?;
                tracing::debug!("Session dated {} has no id, derived {}", date, id);
                id
            }
        };

        Ok(Session {
            id,
            performed_at,
            time_recorded,
            category,
            body_weight: non_negative(raw.body_weight.as_ref()).filter(|w| *w > 0.0),
            body_weight_unit: unit_or_kg(raw.body_weight_unit.as_deref()),
            notes: raw
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
            duration_minutes: count(raw.duration.as_ref()).filter(|d| *d > 0),
            cardio_after: raw.cardio_after.as_ref().map(Loose::as_bool).unwrap_or(false),
            cardio_minutes: count(raw.cardio_minutes.as_ref()).filter(|m| *m > 0),
            exercises: normalize_exercises(raw.exercises.as_ref()),
        })
    }
}

/// Parse and normalize one stored session from JSON
pub fn session_from_json(value: &Value) -> Result<Session> {
    let raw = RawSession::deserialize(value)?;
    Session::try_from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn stored_exercise(value: serde_json::Value) -> RawExercise {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lb_conversion() {
        assert_eq!(to_kilograms(100.0, WeightUnit::Kg), 100.0);
        assert!((to_kilograms(100.0, WeightUnit::Lb) - 45.359237).abs() < 1e-9);
        assert_eq!(to_kilograms(f64::NAN, WeightUnit::Lb), 0.0);
    }

    #[test]
    fn test_null_record_is_zero_record() {
        let record = normalize_exercise(None);
        assert_eq!(record, ExerciseRecord::zero());
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.volume_kg(), 0.0);
    }

    #[test]
    fn test_defaults_applied() {
        let record = normalize_exercise(Some(&stored_exercise(json!({
            "exerciseName": "Squat",
            "weight": 80
        }))));

        assert_eq!(record.unit, WeightUnit::Kg);
        assert_eq!(record.sets, 1);
        assert_eq!(record.reps_per_set, 0);
        assert_eq!(record.bar_weight, 0.0);
        assert!(!record.include_bar_weight);
        assert_eq!(record.effort, 0);
    }

    #[test]
    fn test_legacy_reps_divided_by_sets() {
        let record = normalize_exercise(Some(&stored_exercise(json!({
            "name": "Bench",
            "weight": 60,
            "sets": 3,
            "reps": 30
        }))));
        assert_eq!(record.sets, 3);
        assert_eq!(record.reps_per_set, 10);
    }

    #[test]
    fn test_legacy_reps_without_sets() {
        let record = normalize_exercise(Some(&stored_exercise(json!({
            "name": "Bench",
            "weight": 60,
            "reps": 12
        }))));
        assert_eq!(record.sets, 1);
        assert_eq!(record.reps_per_set, 12);
    }

    #[test]
    fn test_zero_sets_with_reps_becomes_one_set() {
        let record = normalize_exercise(Some(&stored_exercise(json!({
            "name": "Row",
            "sets": 0,
            "reps": 8
        }))));
        assert_eq!(record.sets, 1);
        assert_eq!(record.reps_per_set, 8);
    }

    #[test]
    fn test_explicit_reps_per_set_wins() {
        let record = normalize_exercise(Some(&stored_exercise(json!({
            "name": "Row",
            "sets": 4,
            "repsPerSet": 6,
            "reps": 100
        }))));
        assert_eq!(record.reps_per_set, 6);
    }

    #[test]
    fn test_string_fields_and_lbs_label() {
        let record = normalize_exercise(Some(&stored_exercise(json!({
            "weight": "135",
            "weightUnit": "lbs",
            "sets": "3",
            "reps": "24",
            "effort": "8",
            "useAlternative": true
        }))));

        assert_eq!(record.weight, 135.0);
        assert_eq!(record.unit, WeightUnit::Lb);
        assert_eq!(record.reps_per_set, 8);
        assert_eq!(record.effort, 8);
        assert!(record.use_alternative);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let record = normalize_exercise(Some(&stored_exercise(json!({
            "name": "Curl",
            "weight": -5,
            "perceivedEffort": 14,
            "barWeight": "abc"
        }))));
        assert_eq!(record.weight, 0.0);
        assert_eq!(record.effort, 10);
        assert_eq!(record.bar_weight, 0.0);
    }

    #[test]
    fn test_bar_weight_in_load() {
        let record = normalize_exercise(Some(&stored_exercise(json!({
            "name": "Bench",
            "weight": 40,
            "barWeight": 20,
            "includeBarWeight": true,
            "sets": 2,
            "repsPerSet": 5
        }))));
        assert_eq!(record.kg_weight(), 40.0);
        assert_eq!(record.load_kg(), 60.0);
        assert_eq!(record.volume_kg(), 600.0);
    }

    #[test]
    fn test_keyed_legacy_session() {
        let session = session_from_json(&json!({
            "id": "65a1f0c2e4b0a1b2c3d4e5f6",
            "date": "2024-03-02",
            "type": "push",
            "duration": "50",
            "exercises": {
                "Bench press": { "weight": "80", "weightUnit": "kg", "sets": "3", "reps": "30", "effort": "9" },
                "Dips": null
            }
        }))
        .unwrap();

        assert_eq!(session.category, WorkoutCategory::Push);
        assert_eq!(session.duration_minutes, Some(50));
        assert!(!session.time_recorded);
        assert_eq!(session.exercises.len(), 2);

        let bench = session
            .exercises
            .iter()
            .find(|e| e.name == "Bench press")
            .unwrap();
        assert_eq!(bench.reps_per_set, 10);
        assert_eq!(bench.effort, 9);

        let dips = session.exercises.iter().find(|e| e.name == "Dips").unwrap();
        assert_eq!(dips.weight, 0.0);
    }

    #[test]
    fn test_mistyped_field_is_treated_as_missing() {
        let session = session_from_json(&json!({
            "id": "s1",
            "date": "2024-05-01T10:00:00Z",
            "type": "Pull",
            "notes": 42,
            "exercises": [
                { "exerciseName": "deadlift", "weight": 120, "sets": [3], "repsPerSet": 5, "effort": { "rpe": 8 } }
            ]
        }))
        .unwrap();

        assert_eq!(session.notes, None);
        assert_eq!(session.exercises.len(), 1);
        let deadlift = &session.exercises[0];
        assert_eq!(deadlift.name, "deadlift");
        assert_eq!(deadlift.weight, 120.0);
        assert_eq!(deadlift.sets, 1);
        assert_eq!(deadlift.reps_per_set, 5);
        assert_eq!(deadlift.effort, 0);
    }

    #[test]
    fn test_non_object_exercise_entries_become_zero_records() {
        let session = session_from_json(&json!({
            "date": "2024-05-01",
            "type": "Legs",
            "exercises": [42, "squats", null, { "name": "lunges", "weight": 20 }]
        }))
        .unwrap();

        assert_eq!(session.exercises.len(), 4);
        assert_eq!(session.exercises[0], ExerciseRecord::zero());
        assert_eq!(session.exercises[1], ExerciseRecord::zero());
        assert_eq!(session.exercises[2], ExerciseRecord::zero());
        assert_eq!(session.exercises[3].name, "lunges");

        let keyed = session_from_json(&json!({
            "date": "2024-05-01",
            "type": "Legs",
            "exercises": { "squats": 7 }
        }))
        .unwrap();
        assert_eq!(keyed.exercises.len(), 1);
        assert_eq!(keyed.exercises[0].name, "squats");
        assert_eq!(keyed.exercises[0].weight, 0.0);

        let scalar = session_from_json(&json!({ "date": "2024-05-01", "type": "Legs", "exercises": 3 }))
            .unwrap();
        assert!(scalar.exercises.is_empty());
    }

    #[test]
    fn test_missing_id_is_derived_from_contents() {
        let stored = json!({
            "date": "2024-05-01T10:00:00Z",
            "type": "Push",
            "exercises": [{ "exerciseName": "benchpress", "weight": 60 }]
        });

        let first = session_from_json(&stored).unwrap();
        let second = session_from_json(&stored).unwrap();
        assert_eq!(first.id, second.id);

        let mut other = stored.clone();
        other["exercises"][0]["weight"] = json!(65);
        assert_ne!(session_from_json(&other).unwrap().id, first.id);
    }

    #[test]
    fn test_non_uuid_ids_are_stable() {
        let a = session_id_from_raw("65a1f0c2e4b0a1b2c3d4e5f6");
        let b = session_id_from_raw("65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(a, b);

        let uuid = Uuid::new_v4();
        assert_eq!(session_id_from_raw(&uuid.to_string()), uuid);
    }

    #[test]
    fn test_date_formats() {
        let (dt, recorded) = parse_performed_at("2024-01-05T18:30:00+02:00", None).unwrap();
        assert!(recorded);
        assert_eq!(dt.hour(), 18);

        let (dt, recorded) = parse_performed_at("2024-01-05T06:15:00", None).unwrap();
        assert!(recorded);
        assert_eq!(dt.hour(), 6);

        let (dt, recorded) = parse_performed_at("2024-01-05", Some("21:45")).unwrap();
        assert!(recorded);
        assert_eq!(dt.hour(), 21);
        assert_eq!(dt.day(), 5);

        let (_, recorded) = parse_performed_at("2024-01-05", None).unwrap();
        assert!(!recorded);

        assert!(parse_performed_at("yesterday", None).is_none());
    }

    #[test]
    fn test_session_requires_date_and_category() {
        let missing_date = session_from_json(&json!({ "type": "Pull" }));
        assert!(matches!(missing_date, Err(Error::InvalidSession(_))));

        let bad_category = session_from_json(&json!({ "date": "2024-01-01", "type": "Cardio" }));
        assert!(matches!(bad_category, Err(Error::InvalidSession(_))));
    }

    #[test]
    fn test_zero_duration_is_unknown() {
        let session = session_from_json(&json!({
            "date": "2024-01-01T10:00:00Z",
            "type": "Legs",
            "duration": 0,
            "exercises": []
        }))
        .unwrap();
        assert_eq!(session.duration_minutes, None);
        assert!(session.exercises.is_empty());
    }
}
