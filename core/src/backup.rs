//! Backup export and import.
//!
//! Export turns one user's live records into a self-contained [`Snapshot`].
//! Import merges a snapshot back into a user's live records:
//!
//! - Profile and goals are replaced wholesale when present.
//! - Foods, workouts and meals are de-duplicated by natural key against the
//!   records that were live before the import started (meals against the
//!   current live list).
//! - Workout logs and weight entries are history and are always appended.
//! - Food entries are linked through the food id map, falling back to the
//!   entry's embedded nutrition snapshot; unresolvable entries are dropped.
//!
//! Writes are not wrapped in a transaction. A store failure aborts the import
//! and leaves every record written before it in place.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{
    DEFAULT_WORKOUT_COLOR, Food, FoodSnapshot, ImportCounts, NewFood, NewFoodEntry, NewMeal,
    NewWeightEntry, NewWorkout, NewWorkoutLog, Snapshot, SnapshotFood, SnapshotFoodEntry,
    SnapshotMeal, SnapshotWeightEntry, SnapshotWorkout, SnapshotWorkoutLog,
};
use crate::store::RecordStore;

pub const SNAPSHOT_VERSION: i64 = 2;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Invalid backup format: {0}")]
    InvalidFormat(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

/// Export-id to live-id translation, scoped to a single import call.
type IdMap = HashMap<String, String>;

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Parse snapshot JSON, accepting either a bare snapshot or the
/// `{ "backup": { ... } }` envelope served by the HTTP export endpoint.
pub fn parse_snapshot(json: &str) -> Result<Snapshot, BackupError> {
    let mut value: Value =
        serde_json::from_str(json).map_err(|e| BackupError::InvalidFormat(e.to_string()))?;
    if let Some(inner) = value.get_mut("backup") {
        value = inner.take();
    }
    serde_json::from_value(value).map_err(|e| BackupError::InvalidFormat(e.to_string()))
}

/// Reject documents without a usable version marker.
///
/// The marker only has to be truthy: `null`, `false`, `0`, `NaN` and `""`
/// are rejected, any other value (including `"2"` or `true`) is accepted.
pub fn check_version(snapshot: &Snapshot) -> Result<&Value, BackupError> {
    match &snapshot.version {
        Some(version) if is_truthy(version) => Ok(version),
        _ => Err(BackupError::InvalidFormat(
            "missing version marker".to_string(),
        )),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn export_snapshot<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<Snapshot, BackupError> {
    let profile = store
        .get_profile(user_id)?
        .ok_or_else(|| BackupError::UserNotFound(user_id.to_string()))?;
    let goals = store.get_goals(user_id)?;
    let workouts = store.list_workouts(user_id)?;
    let workout_logs = store.list_workout_logs(user_id)?;
    let foods = store.list_foods(user_id)?;
    let food_entries = store.list_food_entries(user_id)?;
    let weight_entries = store.list_weight_entries(user_id)?;
    let meals = store.list_meals(user_id)?;

    let foods_by_id: HashMap<&str, &Food> = foods.iter().map(|f| (f.id.as_str(), f)).collect();

    let snapshot = Snapshot {
        version: Some(Value::from(SNAPSHOT_VERSION)),
        exported_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        profile: Some(profile),
        goals,
        workouts: workouts
            .iter()
            .map(|w| SnapshotWorkout {
                export_id: Some(w.id.clone()),
                name: w.name.clone(),
                exercises: w.exercises.clone(),
                scheduled_days: w.scheduled_days.clone(),
                color: Some(w.color.clone()),
                created_at: Some(w.created_at.clone()),
            })
            .collect(),
        workout_logs: workout_logs
            .into_iter()
            .map(|l| -> anyhow::Result<SnapshotWorkoutLog> {
                let completed_at = chrono::DateTime::parse_from_rfc3339(&l.completed_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        anyhow::anyhow!("stored workout log {} has bad timestamp: {e}", l.id)
                    })?;
                Ok(SnapshotWorkoutLog {
                    workout_export_id: Some(l.workout_id),
                    workout_name: l.workout_name,
                    completed_at,
                    duration: Some(l.duration),
                    exercise_logs: l.exercise_logs,
                    notes: l.notes,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        foods: foods
            .iter()
            .map(|f| SnapshotFood {
                export_id: Some(f.id.clone()),
                name: f.name.clone(),
                serving_size: f.serving_size.clone(),
                calories: f.calories,
                protein: f.protein,
                carbs: f.carbs,
                fats: f.fats,
                fiber: Some(f.fiber),
                is_saved: Some(f.is_saved),
                created_at: Some(f.created_at.clone()),
            })
            .collect(),
        food_entries: food_entries
            .into_iter()
            .map(|e| {
                let food_snapshot = foods_by_id.get(e.food_id.as_str()).map(|f| FoodSnapshot {
                    name: f.name.clone(),
                    serving_size: f.serving_size.clone(),
                    calories: f.calories,
                    protein: f.protein,
                    carbs: f.carbs,
                    fats: f.fats,
                    fiber: Some(f.fiber),
                });
                SnapshotFoodEntry {
                    food_export_id: Some(e.food_id),
                    meal_type: e.meal_type,
                    servings: Some(e.servings),
                    date: e.date,
                    food_snapshot,
                }
            })
            .collect(),
        weight_entries: weight_entries
            .into_iter()
            .map(|w| SnapshotWeightEntry {
                weight: w.weight,
                date: w.date,
                created_at: Some(w.created_at),
            })
            .collect(),
        meals: meals
            .into_iter()
            .map(|m| SnapshotMeal {
                export_id: Some(m.id),
                name: m.name,
                ingredients: m.ingredients,
                total_servings: Some(m.total_servings),
                created_at: Some(m.created_at),
            })
            .collect(),
    };

    info!(
        user_id,
        workouts = snapshot.workouts.len(),
        foods = snapshot.foods.len(),
        food_entries = snapshot.food_entries.len(),
        "exported backup"
    );
    Ok(snapshot)
}

pub fn import_snapshot<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
    snapshot: &Snapshot,
) -> Result<ImportCounts, BackupError> {
    let version = check_version(snapshot)?;
    debug!(user_id, %version, "importing backup");

    let mut counts = ImportCounts::default();

    if let Some(profile) = &snapshot.profile {
        store.upsert_profile(user_id, profile)?;
    }
    if let Some(goals) = &snapshot.goals {
        store.upsert_goals(user_id, goals)?;
    }

    // Live state before any insert from this import.
    let existing_foods = store.list_foods(user_id)?;
    let existing_workouts = store.list_workouts(user_id)?;

    let mut food_ids = IdMap::new();
    let mut workout_ids = IdMap::new();

    counts.foods = import_foods(store, user_id, &snapshot.foods, &existing_foods, &mut food_ids)?;
    counts.workouts = import_workouts(
        store,
        user_id,
        &snapshot.workouts,
        &existing_workouts,
        &mut workout_ids,
    )?;
    counts.workout_logs =
        import_workout_logs(store, user_id, &snapshot.workout_logs, &workout_ids)?;
    counts.food_entries = import_food_entries(
        store,
        user_id,
        &snapshot.food_entries,
        &existing_foods,
        &food_ids,
    )?;
    counts.weight_entries = import_weight_entries(store, user_id, &snapshot.weight_entries)?;
    counts.meals = import_meals(store, user_id, &snapshot.meals)?;

    info!(
        user_id,
        workouts = counts.workouts,
        workout_logs = counts.workout_logs,
        foods = counts.foods,
        food_entries = counts.food_entries,
        weight_entries = counts.weight_entries,
        meals = counts.meals,
        "imported backup"
    );
    Ok(counts)
}

fn import_foods<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
    foods: &[SnapshotFood],
    existing: &[Food],
    food_ids: &mut IdMap,
) -> anyhow::Result<i64> {
    let mut count = 0;
    for food in foods {
        let matched = existing.iter().find(|f| {
            f.name == food.name
                && f.serving_size == food.serving_size
                && f.calories == food.calories
        });
        let live_id = if let Some(found) = matched {
            found.id.clone()
        } else {
            let created = store.create_food(
                user_id,
                &NewFood {
                    name: food.name.clone(),
                    serving_size: food.serving_size.clone(),
                    calories: food.calories,
                    protein: food.protein,
                    carbs: food.carbs,
                    fats: food.fats,
                    fiber: food.fiber.unwrap_or(0.0),
                    is_saved: food.is_saved.unwrap_or(true),
                },
            )?;
            count += 1;
            created.id
        };
        if let Some(export_id) = non_empty(food.export_id.as_ref()) {
            food_ids.insert(export_id.to_string(), live_id);
        }
    }
    Ok(count)
}

fn import_workouts<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
    workouts: &[SnapshotWorkout],
    existing: &[crate::models::Workout],
    workout_ids: &mut IdMap,
) -> anyhow::Result<i64> {
    let mut count = 0;
    for workout in workouts {
        let live_id = if let Some(found) = existing.iter().find(|w| w.name == workout.name) {
            found.id.clone()
        } else {
            let color = workout
                .color
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_WORKOUT_COLOR.to_string());
            let created = store.create_workout(
                user_id,
                &NewWorkout {
                    name: workout.name.clone(),
                    exercises: workout.exercises.clone(),
                    scheduled_days: workout.scheduled_days.clone(),
                    color,
                },
            )?;
            count += 1;
            created.id
        };
        if let Some(export_id) = non_empty(workout.export_id.as_ref()) {
            workout_ids.insert(export_id.to_string(), live_id);
        }
    }
    Ok(count)
}

fn import_workout_logs<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
    logs: &[SnapshotWorkoutLog],
    workout_ids: &IdMap,
) -> anyhow::Result<i64> {
    let mut count = 0;
    for log in logs {
        let workout_id = non_empty(log.workout_export_id.as_ref())
            .and_then(|id| workout_ids.get(id))
            .cloned()
            .unwrap_or_default();
        if workout_id.is_empty() {
            debug!(workout_name = %log.workout_name, "workout log has no live workout");
        }
        store.create_workout_log(
            user_id,
            &NewWorkoutLog {
                workout_id,
                workout_name: log.workout_name.clone(),
                completed_at: log.completed_at,
                duration: log.duration.unwrap_or(0),
                exercise_logs: log.exercise_logs.clone(),
                notes: log.notes.clone(),
            },
        )?;
        count += 1;
    }
    Ok(count)
}

/// Resolve the live food for an entry: id map first, then a name and serving
/// size match on the embedded snapshot, then a fresh unsaved food.
fn resolve_entry_food<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
    entry: &SnapshotFoodEntry,
    existing: &[Food],
    food_ids: &IdMap,
) -> anyhow::Result<Option<String>> {
    if let Some(id) = non_empty(entry.food_export_id.as_ref()).and_then(|id| food_ids.get(id)) {
        return Ok(Some(id.clone()));
    }
    let Some(snap) = &entry.food_snapshot else {
        return Ok(None);
    };
    if let Some(found) = existing
        .iter()
        .find(|f| f.name == snap.name && f.serving_size == snap.serving_size)
    {
        return Ok(Some(found.id.clone()));
    }
    let created = store.create_food(
        user_id,
        &NewFood {
            name: snap.name.clone(),
            serving_size: snap.serving_size.clone(),
            calories: snap.calories,
            protein: snap.protein,
            carbs: snap.carbs,
            fats: snap.fats,
            fiber: snap.fiber.unwrap_or(0.0),
            is_saved: false,
        },
    )?;
    Ok(Some(created.id))
}

fn import_food_entries<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
    entries: &[SnapshotFoodEntry],
    existing: &[Food],
    food_ids: &IdMap,
) -> anyhow::Result<i64> {
    let mut count = 0;
    for entry in entries {
        let Some(food_id) = resolve_entry_food(store, user_id, entry, existing, food_ids)? else {
            debug!(date = %entry.date, "dropping food entry with unresolvable food");
            continue;
        };
        store.create_food_entry(
            user_id,
            &NewFoodEntry {
                food_id,
                meal_type: entry.meal_type.clone(),
                servings: entry.servings.filter(|s| *s != 0.0).unwrap_or(1.0),
                date: entry.date.clone(),
            },
        )?;
        count += 1;
    }
    Ok(count)
}

fn import_weight_entries<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
    entries: &[SnapshotWeightEntry],
) -> anyhow::Result<i64> {
    let mut count = 0;
    for entry in entries {
        store.create_weight_entry(
            user_id,
            &NewWeightEntry {
                weight: entry.weight,
                date: entry.date.clone(),
            },
        )?;
        count += 1;
    }
    Ok(count)
}

fn import_meals<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
    meals: &[SnapshotMeal],
) -> anyhow::Result<i64> {
    let mut count = 0;
    for meal in meals {
        // Re-read each time so meals created earlier in this loop count as live.
        let exists = store.list_meals(user_id)?.iter().any(|m| m.name == meal.name);
        if exists {
            continue;
        }
        store.create_meal(
            user_id,
            &NewMeal {
                name: meal.name.clone(),
                ingredients: meal.ingredients.clone(),
                total_servings: meal.total_servings.filter(|s| *s != 0).unwrap_or(1),
            },
        )?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use anyhow::{Result, bail};
    use serde_json::json;

    use super::*;
    use crate::db::Database;
    use crate::models::{
        FoodEntry, Goals, Meal, Profile, WeightEntry, Workout, WorkoutLog,
    };

    const USER: &str = "user-1";

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.ensure_user(USER).unwrap();
        db
    }

    fn snapshot(value: serde_json::Value) -> Snapshot {
        serde_json::from_value(value).unwrap()
    }

    fn banana_snapshot() -> Snapshot {
        snapshot(json!({
            "version": 2,
            "exportedAt": "2024-01-16T08:00:00.000Z",
            "foods": [{
                "exportId": "f1", "name": "Banana", "servingSize": "1 medium",
                "calories": 105, "protein": 1.3, "carbs": 27, "fats": 0.4,
                "fiber": 3.1, "isSaved": true
            }],
            "foodEntries": [{
                "foodExportId": "f1", "mealType": "snack", "servings": 2,
                "date": "2024-01-15",
                "foodSnapshot": {
                    "name": "Banana", "servingSize": "1 medium", "calories": 105,
                    "protein": 1.3, "carbs": 27, "fats": 0.4, "fiber": 3.1
                }
            }]
        }))
    }

    fn full_snapshot() -> Snapshot {
        snapshot(json!({
            "version": 2,
            "profile": {"name": "Ada", "avatar": "venus", "units": "metric"},
            "goals": {
                "dailyCalories": 2000, "dailyProtein": 140, "dailyCarbs": 200,
                "dailyFats": 60, "weeklyWorkouts": 5, "targetWeight": 65.5
            },
            "workouts": [{
                "exportId": "w1", "name": "Leg Day",
                "exercises": [{"id": "e1", "name": "Squat", "sets": 5, "reps": 5, "weight": 225}],
                "scheduledDays": [2, 5], "color": "#00AA00"
            }],
            "workoutLogs": [{
                "workoutExportId": "w1", "workoutName": "Leg Day",
                "completedAt": "2024-01-15T18:00:00.000Z", "duration": 60,
                "exerciseLogs": [{"exerciseId": "e1", "name": "Squat",
                                  "sets": [{"reps": 5, "weight": 225, "completed": true}]}],
                "notes": "felt strong"
            }],
            "foods": [{
                "exportId": "f1", "name": "Rice", "servingSize": "1 cup",
                "calories": 206, "protein": 4.3, "carbs": 45, "fats": 0.4
            }],
            "foodEntries": [{
                "foodExportId": "f1", "mealType": "dinner", "servings": 1.5,
                "date": "2024-01-15"
            }],
            "weightEntries": [
                {"weight": 66.2, "date": "2024-01-14"},
                {"weight": 66.0, "date": "2024-01-15"}
            ],
            "meals": [{
                "exportId": "m1", "name": "Burrito Bowl", "totalServings": 3,
                "ingredients": [{"name": "Rice", "amount": 2, "unit": "cup",
                                 "calories": 412, "protein": 8.6, "carbs": 90, "fats": 0.8}]
            }]
        }))
    }

    // --- Store double ---

    /// In-memory store that records every call and can be told to fail.
    #[derive(Default)]
    struct RecordingStore {
        calls: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
        foods: RefCell<Vec<Food>>,
        workouts: RefCell<Vec<Workout>>,
        next_id: Cell<u32>,
    }

    impl RecordingStore {
        fn failing_on(call: &'static str) -> Self {
            Self {
                fail_on: Some(call),
                ..Self::default()
            }
        }

        fn record(&self, call: &str) -> Result<String> {
            self.calls.borrow_mut().push(call.to_string());
            if self.fail_on == Some(call) {
                bail!("simulated failure in {call}");
            }
            self.next_id.set(self.next_id.get() + 1);
            Ok(format!("id-{}", self.next_id.get()))
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl RecordStore for RecordingStore {
        fn get_profile(&self, _: &str) -> Result<Option<Profile>> {
            self.record("get_profile")?;
            Ok(Some(Profile::default()))
        }
        fn upsert_profile(&self, _: &str, profile: &Profile) -> Result<Profile> {
            self.record("upsert_profile")?;
            Ok(profile.clone())
        }
        fn get_goals(&self, _: &str) -> Result<Option<Goals>> {
            self.record("get_goals")?;
            Ok(None)
        }
        fn upsert_goals(&self, _: &str, goals: &Goals) -> Result<Goals> {
            self.record("upsert_goals")?;
            Ok(goals.clone())
        }
        fn list_workouts(&self, _: &str) -> Result<Vec<Workout>> {
            self.record("list_workouts")?;
            Ok(self.workouts.borrow().clone())
        }
        fn create_workout(&self, _: &str, workout: &NewWorkout) -> Result<Workout> {
            let id = self.record("create_workout")?;
            let created = Workout {
                id,
                name: workout.name.clone(),
                exercises: workout.exercises.clone(),
                scheduled_days: workout.scheduled_days.clone(),
                color: workout.color.clone(),
                created_at: String::new(),
            };
            self.workouts.borrow_mut().push(created.clone());
            Ok(created)
        }
        fn list_workout_logs(&self, _: &str) -> Result<Vec<WorkoutLog>> {
            self.record("list_workout_logs")?;
            Ok(Vec::new())
        }
        fn create_workout_log(&self, _: &str, log: &NewWorkoutLog) -> Result<WorkoutLog> {
            let id = self.record("create_workout_log")?;
            Ok(WorkoutLog {
                id,
                workout_id: log.workout_id.clone(),
                workout_name: log.workout_name.clone(),
                completed_at: log.completed_at.to_rfc3339(),
                duration: log.duration,
                exercise_logs: log.exercise_logs.clone(),
                notes: log.notes.clone(),
            })
        }
        fn list_foods(&self, _: &str) -> Result<Vec<Food>> {
            self.record("list_foods")?;
            Ok(self.foods.borrow().clone())
        }
        fn create_food(&self, _: &str, food: &NewFood) -> Result<Food> {
            let id = self.record("create_food")?;
            let created = Food {
                id,
                name: food.name.clone(),
                serving_size: food.serving_size.clone(),
                calories: food.calories,
                protein: food.protein,
                carbs: food.carbs,
                fats: food.fats,
                fiber: food.fiber,
                is_saved: food.is_saved,
                created_at: String::new(),
            };
            self.foods.borrow_mut().push(created.clone());
            Ok(created)
        }
        fn list_food_entries(&self, _: &str) -> Result<Vec<FoodEntry>> {
            self.record("list_food_entries")?;
            Ok(Vec::new())
        }
        fn create_food_entry(&self, _: &str, entry: &NewFoodEntry) -> Result<FoodEntry> {
            let id = self.record("create_food_entry")?;
            Ok(FoodEntry {
                id,
                food_id: entry.food_id.clone(),
                meal_type: entry.meal_type.clone(),
                servings: entry.servings,
                date: entry.date.clone(),
                created_at: String::new(),
            })
        }
        fn list_weight_entries(&self, _: &str) -> Result<Vec<WeightEntry>> {
            self.record("list_weight_entries")?;
            Ok(Vec::new())
        }
        fn create_weight_entry(&self, _: &str, entry: &NewWeightEntry) -> Result<WeightEntry> {
            let id = self.record("create_weight_entry")?;
            Ok(WeightEntry {
                id,
                weight: entry.weight,
                date: entry.date.clone(),
                created_at: String::new(),
            })
        }
        fn list_meals(&self, _: &str) -> Result<Vec<Meal>> {
            self.record("list_meals")?;
            Ok(Vec::new())
        }
        fn create_meal(&self, _: &str, meal: &NewMeal) -> Result<Meal> {
            let id = self.record("create_meal")?;
            Ok(Meal {
                id,
                name: meal.name.clone(),
                ingredients: meal.ingredients.clone(),
                total_servings: meal.total_servings,
                created_at: String::new(),
            })
        }
    }

    // --- Import ---

    #[test]
    fn test_import_banana_into_empty_store() {
        let db = test_db();
        let counts = import_snapshot(&db, USER, &banana_snapshot()).unwrap();

        assert_eq!(
            counts,
            ImportCounts {
                foods: 1,
                food_entries: 1,
                ..ImportCounts::default()
            }
        );

        let foods = db.get_foods(USER).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].calories, 105);
        assert_ne!(foods[0].id, "f1");

        let entries = db.get_food_entries(USER, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].food_id, foods[0].id);
        assert!((entries[0].servings - 2.0).abs() < f64::EPSILON);
        assert_eq!(entries[0].meal_type, "snack");
        assert_eq!(entries[0].date, "2024-01-15");
    }

    #[test]
    fn test_reimport_skips_workouts_foods_and_meals() {
        let db = test_db();
        let data = full_snapshot();

        let first = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(first.workouts, 1);
        assert_eq!(first.foods, 1);
        assert_eq!(first.meals, 1);

        let second = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(second.workouts, 0);
        assert_eq!(second.foods, 0);
        assert_eq!(second.meals, 0);

        assert_eq!(db.get_workouts(USER).unwrap().len(), 1);
        assert_eq!(db.get_foods(USER).unwrap().len(), 1);
        assert_eq!(db.get_meals(USER).unwrap().len(), 1);
    }

    #[test]
    fn test_reimport_appends_history_again() {
        let db = test_db();
        let data = full_snapshot();

        import_snapshot(&db, USER, &data).unwrap();
        let second = import_snapshot(&db, USER, &data).unwrap();

        assert_eq!(second.workout_logs, 1);
        assert_eq!(second.weight_entries, 2);
        assert_eq!(db.get_workout_logs(USER).unwrap().len(), 2);
        assert_eq!(db.get_weight_entries(USER).unwrap().len(), 4);
    }

    #[test]
    fn test_reimport_food_entries_link_to_existing_food() {
        let db = test_db();
        let data = full_snapshot();

        import_snapshot(&db, USER, &data).unwrap();
        let second = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(second.food_entries, 1);

        let food_id = db.get_foods(USER).unwrap()[0].id.clone();
        let entries = db.get_food_entries(USER, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.food_id == food_id));
    }

    #[test]
    fn test_workout_log_resolves_to_new_workout_id() {
        let db = test_db();
        import_snapshot(&db, USER, &full_snapshot()).unwrap();

        let workout = &db.get_workouts(USER).unwrap()[0];
        assert_ne!(workout.id, "w1");
        assert_eq!(workout.color, "#00AA00");
        assert_eq!(workout.scheduled_days, vec![2, 5]);

        let logs = db.get_workout_logs(USER).unwrap();
        assert_eq!(logs[0].workout_id, workout.id);
        assert_eq!(logs[0].notes.as_deref(), Some("felt strong"));
        assert_eq!(logs[0].exercise_logs[0].sets[0].reps, 5);
    }

    #[test]
    fn test_workout_log_resolves_to_existing_workout_by_name() {
        let db = test_db();
        let existing = db
            .insert_workout(
                USER,
                &NewWorkout {
                    name: "Leg Day".to_string(),
                    exercises: Vec::new(),
                    scheduled_days: Vec::new(),
                    color: DEFAULT_WORKOUT_COLOR.to_string(),
                },
            )
            .unwrap();

        let counts = import_snapshot(&db, USER, &full_snapshot()).unwrap();
        assert_eq!(counts.workouts, 0);
        assert_eq!(db.get_workout_logs(USER).unwrap()[0].workout_id, existing.id);
    }

    #[test]
    fn test_dangling_workout_reference_still_inserted() {
        let db = test_db();
        let data = snapshot(json!({
            "version": 2,
            "workoutLogs": [{
                "workoutExportId": "gone", "workoutName": "Old Routine",
                "completedAt": "2023-12-01T07:00:00Z"
            }]
        }));

        let counts = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(counts.workout_logs, 1);

        let logs = db.get_workout_logs(USER).unwrap();
        assert_eq!(logs[0].workout_id, "");
        assert_eq!(logs[0].workout_name, "Old Routine");
        assert_eq!(logs[0].duration, 0);
    }

    #[test]
    fn test_food_entry_rebuilt_from_snapshot_as_unsaved_food() {
        let db = test_db();
        let data = snapshot(json!({
            "version": 2,
            "foodEntries": [{
                "foodExportId": "deleted-food", "mealType": "lunch", "servings": 1,
                "date": "2024-01-15",
                "foodSnapshot": {"name": "Soup", "servingSize": "1 bowl", "calories": 180,
                                 "protein": 9, "carbs": 20, "fats": 6}
            }]
        }));

        let counts = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(counts.foods, 0);
        assert_eq!(counts.food_entries, 1);

        let foods = db.get_foods(USER).unwrap();
        assert_eq!(foods.len(), 1);
        assert!(!foods[0].is_saved);
        assert!(foods[0].fiber.abs() < f64::EPSILON);
        assert_eq!(db.get_food_entries(USER, None).unwrap()[0].food_id, foods[0].id);
    }

    #[test]
    fn test_food_entry_second_chance_match_ignores_calories() {
        let db = test_db();
        let live = db
            .insert_food(
                USER,
                &NewFood {
                    name: "Soup".to_string(),
                    serving_size: "1 bowl".to_string(),
                    calories: 150,
                    protein: 8.0,
                    carbs: 18.0,
                    fats: 5.0,
                    fiber: 2.0,
                    is_saved: true,
                },
            )
            .unwrap();
        let data = snapshot(json!({
            "version": 2,
            "foodEntries": [{
                "mealType": "lunch", "servings": 1, "date": "2024-01-15",
                "foodSnapshot": {"name": "Soup", "servingSize": "1 bowl", "calories": 180,
                                 "protein": 9, "carbs": 20, "fats": 6}
            }]
        }));

        import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(db.get_foods(USER).unwrap().len(), 1);
        assert_eq!(db.get_food_entries(USER, None).unwrap()[0].food_id, live.id);
    }

    #[test]
    fn test_unresolvable_food_entry_dropped_silently() {
        let db = test_db();
        let data = snapshot(json!({
            "version": 2,
            "foodEntries": [
                {"foodExportId": "nope", "mealType": "lunch", "servings": 1, "date": "2024-01-15"},
                {"mealType": "dinner", "date": "2024-01-15", "foodSnapshot": null}
            ],
            "weightEntries": [{"weight": 180.2, "date": "2024-01-15"}]
        }));

        let counts = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(counts.food_entries, 0);
        assert_eq!(counts.weight_entries, 1);
        assert!(db.get_food_entries(USER, None).unwrap().is_empty());
    }

    #[test]
    fn test_missing_version_rejected_before_any_store_call() {
        let store = RecordingStore::default();
        let mut data = full_snapshot();
        data.version = None;

        let err = import_snapshot(&store, USER, &data).unwrap_err();
        assert!(matches!(err, BackupError::InvalidFormat(_)));
        assert!(store.calls().is_empty());

        for falsy in [json!(0), json!(false), json!(""), json!(0.0)] {
            data.version = Some(falsy);
            assert!(matches!(
                import_snapshot(&store, USER, &data),
                Err(BackupError::InvalidFormat(_))
            ));
        }
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_any_truthy_version_accepted() {
        for version in [json!(99), json!("2"), json!("0"), json!(true), json!(1.5), json!({})] {
            let store = RecordingStore::default();
            let data = snapshot(json!({ "version": version }));
            assert_eq!(
                import_snapshot(&store, USER, &data).unwrap(),
                ImportCounts::default()
            );
        }
    }

    #[test]
    fn test_goals_replaced_wholesale() {
        let db = test_db();
        db.upsert_goals(
            USER,
            &Goals {
                daily_calories: 3000,
                daily_protein: 200,
                daily_carbs: 350,
                daily_fats: 90,
                weekly_workouts: 6,
                target_weight: 190.0,
            },
        )
        .unwrap();

        import_snapshot(&db, USER, &full_snapshot()).unwrap();

        let goals = db.get_goals(USER).unwrap().unwrap();
        assert_eq!(
            goals,
            Goals {
                daily_calories: 2000,
                daily_protein: 140,
                daily_carbs: 200,
                daily_fats: 60,
                weekly_workouts: 5,
                target_weight: 65.5,
            }
        );
    }

    #[test]
    fn test_profile_replaced_and_goals_created() {
        let db = test_db();
        assert!(db.get_goals(USER).unwrap().is_none());

        import_snapshot(&db, USER, &full_snapshot()).unwrap();

        let profile = db.get_profile(USER).unwrap().unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.avatar, "venus");
        assert_eq!(profile.units, "metric");
        assert!(db.get_goals(USER).unwrap().is_some());
    }

    #[test]
    fn test_absent_profile_and_goals_left_untouched() {
        let db = test_db();
        db.upsert_goals(USER, &Goals::default()).unwrap();

        import_snapshot(&db, USER, &banana_snapshot()).unwrap();

        assert_eq!(db.get_profile(USER).unwrap().unwrap(), Profile::default());
        assert_eq!(db.get_goals(USER).unwrap().unwrap(), Goals::default());
    }

    #[test]
    fn test_duplicate_foods_within_one_snapshot_both_inserted() {
        let db = test_db();
        let data = snapshot(json!({
            "version": 2,
            "foods": [
                {"exportId": "a", "name": "Egg", "servingSize": "1 large", "calories": 72,
                 "protein": 6.3, "carbs": 0.4, "fats": 4.8},
                {"exportId": "b", "name": "Egg", "servingSize": "1 large", "calories": 72,
                 "protein": 6.3, "carbs": 0.4, "fats": 4.8}
            ]
        }));

        let counts = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(counts.foods, 2);
        assert_eq!(db.get_foods(USER).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_meals_within_one_snapshot_inserted_once() {
        let db = test_db();
        let data = snapshot(json!({
            "version": 2,
            "meals": [
                {"exportId": "m1", "name": "Stew", "totalServings": 4},
                {"exportId": "m2", "name": "Stew", "totalServings": 6}
            ]
        }));

        let counts = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(counts.meals, 1);
        assert_eq!(db.get_meals(USER).unwrap()[0].total_servings, 4);
    }

    #[test]
    fn test_import_defaults_applied() {
        let db = test_db();
        let data = snapshot(json!({
            "version": 2,
            "workouts": [{"exportId": "w1", "name": "Mobility"}],
            "foods": [{"exportId": "f1", "name": "Tea", "servingSize": "1 cup",
                       "calories": 2, "protein": 0, "carbs": 0.5, "fats": 0}],
            "foodEntries": [{"foodExportId": "f1", "mealType": "breakfast", "servings": 0,
                             "date": "2024-01-15"}],
            "meals": [{"name": "Plain Toast", "totalServings": 0}]
        }));

        import_snapshot(&db, USER, &data).unwrap();

        let workout = &db.get_workouts(USER).unwrap()[0];
        assert_eq!(workout.color, DEFAULT_WORKOUT_COLOR);
        assert!(workout.exercises.is_empty());
        let food = &db.get_foods(USER).unwrap()[0];
        assert!(food.is_saved);
        assert!(food.fiber.abs() < f64::EPSILON);
        let entry = &db.get_food_entries(USER, None).unwrap()[0];
        assert!((entry.servings - 1.0).abs() < f64::EPSILON);
        assert_eq!(db.get_meals(USER).unwrap()[0].total_servings, 1);
    }

    #[test]
    fn test_loose_exercise_shapes_accepted() {
        let db = test_db();
        let data = snapshot(json!({
            "version": 2,
            "workouts": [{"exportId": "w1", "name": "Core",
                          "exercises": [{"name": "Plank", "notes": "60s holds"}, {}]}],
            "workoutLogs": [{"workoutExportId": "w1", "workoutName": "Core",
                             "completedAt": "2024-01-15T10:00:00.000Z",
                             "exerciseLogs": [{"sets": [{"completed": true}, {}]}]}]
        }));

        let counts = import_snapshot(&db, USER, &data).unwrap();
        assert_eq!(counts.workouts, 1);
        assert_eq!(counts.workout_logs, 1);

        let workout = &db.get_workouts(USER).unwrap()[0];
        assert_eq!(workout.exercises.len(), 2);
        assert_eq!(workout.exercises[0].name, "Plank");
        assert_eq!(workout.exercises[0].sets, 0);
        let log = &db.get_workout_logs(USER).unwrap()[0];
        assert_eq!(log.exercise_logs[0].name, "");
        assert!(log.exercise_logs[0].sets[0].completed);
        assert_eq!(log.exercise_logs[0].sets[1].reps, 0);
    }

    #[test]
    fn test_persistence_failure_keeps_earlier_writes() {
        let store = RecordingStore::failing_on("create_workout_log");
        let err = import_snapshot(&store, USER, &full_snapshot()).unwrap_err();
        assert!(matches!(err, BackupError::Persistence(_)));

        let calls = store.calls();
        assert!(calls.contains(&"create_food".to_string()));
        assert!(calls.contains(&"create_workout".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("create_workout_log"));
        assert!(!calls.contains(&"create_food_entry".to_string()));
        assert_eq!(store.foods.borrow().len(), 1);
    }

    #[test]
    fn test_id_maps_populated_before_history() {
        let store = RecordingStore::default();
        import_snapshot(&store, USER, &full_snapshot()).unwrap();

        let calls = store.calls();
        let position = |name: &str| calls.iter().position(|c| c == name).unwrap();
        assert!(position("create_food") < position("create_workout"));
        assert!(position("create_workout") < position("create_workout_log"));
        assert!(position("create_workout_log") < position("create_food_entry"));
        assert!(position("create_food_entry") < position("create_weight_entry"));
        assert!(position("create_weight_entry") < position("create_meal"));
    }

    // --- Export ---

    #[test]
    fn test_export_unknown_user_fails() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            export_snapshot(&db, "ghost"),
            Err(BackupError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_export_carries_export_ids_and_food_snapshots() {
        let db = test_db();
        import_snapshot(&db, USER, &full_snapshot()).unwrap();

        let exported = export_snapshot(&db, USER).unwrap();
        assert_eq!(exported.version, Some(json!(SNAPSHOT_VERSION)));
        assert!(exported.exported_at.is_some());
        assert_eq!(exported.profile.as_ref().unwrap().name, "Ada");

        let food_id = db.get_foods(USER).unwrap()[0].id.clone();
        assert_eq!(exported.foods[0].export_id.as_deref(), Some(food_id.as_str()));
        let entry = &exported.food_entries[0];
        assert_eq!(entry.food_export_id.as_deref(), Some(food_id.as_str()));
        assert_eq!(entry.food_snapshot.as_ref().unwrap().name, "Rice");

        let workout_id = db.get_workouts(USER).unwrap()[0].id.clone();
        assert_eq!(
            exported.workout_logs[0].workout_export_id.as_deref(),
            Some(workout_id.as_str())
        );
        assert_eq!(exported.weight_entries.len(), 2);
        assert_eq!(exported.meals[0].total_servings, Some(3));
    }

    #[test]
    fn test_export_then_import_into_fresh_user() {
        let db = test_db();
        import_snapshot(&db, USER, &full_snapshot()).unwrap();
        let exported = export_snapshot(&db, USER).unwrap();

        db.ensure_user("user-2").unwrap();
        let counts = import_snapshot(&db, "user-2", &exported).unwrap();
        assert_eq!(
            counts,
            ImportCounts {
                workouts: 1,
                workout_logs: 1,
                foods: 1,
                food_entries: 1,
                weight_entries: 2,
                meals: 1,
            }
        );

        let new_workout = &db.get_workouts("user-2").unwrap()[0];
        assert_eq!(
            db.get_workout_logs("user-2").unwrap()[0].workout_id,
            new_workout.id
        );
    }

    #[test]
    fn test_deleted_records_before_export() {
        let db = test_db();
        import_snapshot(&db, USER, &full_snapshot()).unwrap();
        let workout_id = db.get_workouts(USER).unwrap()[0].id.clone();
        let rice_id = db.get_foods(USER).unwrap()[0].id.clone();
        let oats = db
            .insert_food(
                USER,
                &NewFood {
                    name: "Oats".to_string(),
                    serving_size: "40g".to_string(),
                    calories: 150,
                    protein: 5.0,
                    carbs: 27.0,
                    fats: 3.0,
                    fiber: 4.0,
                    is_saved: true,
                },
            )
            .unwrap();
        db.insert_food_entry(
            USER,
            &NewFoodEntry {
                food_id: oats.id.clone(),
                meal_type: "breakfast".to_string(),
                servings: 1.0,
                date: "2024-01-16".to_string(),
            },
        )
        .unwrap();

        db.delete_workout(USER, &workout_id).unwrap();
        db.delete_food(USER, &rice_id).unwrap();
        let exported = export_snapshot(&db, USER).unwrap();
        assert!(exported.workouts.is_empty());
        assert_eq!(exported.food_entries.len(), 1);
        assert_eq!(
            exported.workout_logs[0].workout_export_id.as_deref(),
            Some(workout_id.as_str())
        );

        db.ensure_user("user-2").unwrap();
        let counts = import_snapshot(&db, "user-2", &exported).unwrap();
        assert_eq!(counts.workout_logs, 1);
        assert_eq!(counts.food_entries, 1);
        assert_eq!(db.get_workout_logs("user-2").unwrap()[0].workout_id, "");

        // Without the foods list the entry falls back to its nutrition snapshot.
        let mut entries_only = exported.clone();
        entries_only.foods.clear();
        db.ensure_user("user-3").unwrap();
        let counts = import_snapshot(&db, "user-3", &entries_only).unwrap();
        assert_eq!(counts.food_entries, 1);
        let rebuilt = &db.get_foods("user-3").unwrap()[0];
        assert_eq!(rebuilt.name, "Oats");
        assert_eq!(rebuilt.calories, 150);
        assert!(!rebuilt.is_saved);
        assert_eq!(db.get_food_entries("user-3", None).unwrap()[0].food_id, rebuilt.id);
    }

    #[test]
    fn test_export_json_shape() {
        let db = test_db();
        import_snapshot(&db, USER, &banana_snapshot()).unwrap();
        let value = serde_json::to_value(export_snapshot(&db, USER).unwrap()).unwrap();

        assert_eq!(value["version"], 2);
        assert!(value["goals"].is_null());
        assert_eq!(value["foods"][0]["servingSize"], "1 medium");
        assert_eq!(value["foodEntries"][0]["foodSnapshot"]["calories"], 105);
        assert!(value["workouts"].as_array().unwrap().is_empty());
    }

    // --- Parsing ---

    #[test]
    fn test_parse_snapshot_accepts_envelope() {
        let raw = r#"{"success": true, "backup": {"version": 2, "weightEntries": []}}"#;
        let parsed = parse_snapshot(raw).unwrap();
        assert_eq!(parsed.version, Some(json!(2)));
    }

    #[test]
    fn test_parse_snapshot_rejects_garbage() {
        assert!(matches!(
            parse_snapshot("not json"),
            Err(BackupError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_snapshot(r#"{"version": 2, "foods": [{"name": 5}]}"#),
            Err(BackupError::InvalidFormat(_))
        ));
    }
}
