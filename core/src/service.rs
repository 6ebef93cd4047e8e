use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backup::{self, BackupError};
use crate::db::Database;
use crate::models::{
    DEFAULT_WORKOUT_COLOR, Exercise, ExerciseLog, Food, FoodEntry, Goals, ImportCounts, Meal,
    MealIngredient, NewFood, NewFoodEntry, NewMeal, NewWeightEntry, NewWorkout, NewWorkoutLog,
    Profile, SetLog, Snapshot, WeightEntry, Workout, WorkoutLog,
};

/// Everything the CLI and HTTP server do, scoped to one acting user.
pub struct StrideService {
    db: Database,
    user_id: String,
}

impl StrideService {
    pub fn new(db_path: &str, user_id: &str) -> Result<Self> {
        let db = Database::open(Path::new(db_path))?;
        Self::with_database(db, user_id)
    }

    pub fn new_in_memory(user_id: &str) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Self::with_database(db, user_id)
    }

    fn with_database(db: Database, user_id: &str) -> Result<Self> {
        if user_id.trim().is_empty() {
            bail!("User id must not be empty");
        }
        db.ensure_user(user_id)?;
        Ok(Self {
            db,
            user_id: user_id.to_string(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    // --- Backup ---

    pub fn export_backup(&self) -> Result<Snapshot, BackupError> {
        backup::export_snapshot(&self.db, &self.user_id)
    }

    pub fn import_backup(&self, snapshot: &Snapshot) -> Result<ImportCounts, BackupError> {
        backup::import_snapshot(&self.db, &self.user_id, snapshot)
    }

    /// Parse and import raw snapshot JSON (bare or `{ "backup": ... }`).
    pub fn import_backup_json(&self, json: &str) -> Result<ImportCounts, BackupError> {
        let snapshot = backup::parse_snapshot(json)?;
        self.import_backup(&snapshot)
    }

    // --- Profile / goals ---

    pub fn get_profile(&self) -> Result<Profile> {
        self.db
            .get_profile(&self.user_id)?
            .context("User not found")
    }

    pub fn update_profile(
        &self,
        name: Option<&str>,
        avatar: Option<&str>,
        units: Option<&str>,
    ) -> Result<Profile> {
        let mut profile = self.get_profile()?;
        if let Some(name) = name {
            if name.trim().is_empty() {
                bail!("Name must not be empty");
            }
            profile.name = name.trim().to_string();
        }
        if let Some(avatar) = avatar {
            profile.avatar = crate::models::validate_avatar(avatar)?;
        }
        if let Some(units) = units {
            profile.units = crate::models::validate_units(units)?;
        }
        self.db.update_profile(&self.user_id, &profile)
    }

    /// Stored goals, or the defaults when none have been set.
    pub fn get_goals(&self) -> Result<Goals> {
        Ok(self.db.get_goals(&self.user_id)?.unwrap_or_default())
    }

    pub fn set_goals(&self, goals: &Goals) -> Result<Goals> {
        if goals.daily_calories < 0
            || goals.daily_protein < 0
            || goals.daily_carbs < 0
            || goals.daily_fats < 0
        {
            bail!("Goals must not be negative");
        }
        if !(0..=7).contains(&goals.weekly_workouts) {
            bail!("Weekly workouts must be between 0 and 7");
        }
        if goals.target_weight <= 0.0 {
            bail!("Target weight must be positive");
        }
        self.db.upsert_goals(&self.user_id, goals)
    }

    // --- Foods ---

    pub fn add_food(&self, food: &NewFood) -> Result<Food> {
        crate::models::validate_new_food(food)?;
        self.db.insert_food(&self.user_id, food)
    }

    pub fn list_foods(&self, saved_only: bool) -> Result<Vec<Food>> {
        let mut foods = self.db.get_foods(&self.user_id)?;
        if saved_only {
            foods.retain(|f| f.is_saved);
        }
        Ok(foods)
    }

    pub fn get_food(&self, id: &str) -> Result<Food> {
        self.db.get_food(&self.user_id, id)
    }

    /// Deleting a food also deletes every entry logged against it.
    pub fn delete_food(&self, id: &str) -> Result<()> {
        self.db.delete_food(&self.user_id, id)
    }

    pub fn log_food(
        &self,
        food_id: &str,
        servings: f64,
        meal_type: &str,
        date: &str,
    ) -> Result<FoodEntry> {
        let meal_type = crate::models::validate_meal_type(meal_type)?;
        let date = crate::models::validate_date(date)?;
        if servings <= 0.0 {
            bail!("Servings must be positive");
        }
        let food = self.db.get_food(&self.user_id, food_id)?;
        self.db.insert_food_entry(
            &self.user_id,
            &NewFoodEntry {
                food_id: food.id,
                meal_type,
                servings,
                date: date.format("%Y-%m-%d").to_string(),
            },
        )
    }

    pub fn food_entries(&self, date: Option<&str>) -> Result<Vec<FoodEntry>> {
        self.db.get_food_entries(&self.user_id, date)
    }

    pub fn delete_food_entry(&self, id: &str) -> Result<()> {
        self.db.delete_food_entry(&self.user_id, id)
    }

    // --- Workouts ---

    pub fn add_workout(
        &self,
        name: &str,
        mut exercises: Vec<Exercise>,
        scheduled_days: Vec<u8>,
        color: Option<&str>,
    ) -> Result<Workout> {
        if name.trim().is_empty() {
            bail!("Workout name must not be empty");
        }
        crate::models::validate_scheduled_days(&scheduled_days)?;
        for exercise in &mut exercises {
            if exercise.name.trim().is_empty() {
                bail!("Exercise name must not be empty");
            }
            if exercise.sets < 0 || exercise.reps < 0 || exercise.weight < 0.0 {
                bail!("{} sets, reps and weight must not be negative", exercise.name);
            }
            if exercise.id.is_empty() {
                exercise.id = Uuid::new_v4().to_string();
            }
        }
        self.db.insert_workout(
            &self.user_id,
            &NewWorkout {
                name: name.trim().to_string(),
                exercises,
                scheduled_days,
                color: color.unwrap_or(DEFAULT_WORKOUT_COLOR).to_string(),
            },
        )
    }

    pub fn list_workouts(&self) -> Result<Vec<Workout>> {
        self.db.get_workouts(&self.user_id)
    }

    /// Completed sessions of the workout stay in the history.
    pub fn delete_workout(&self, id: &str) -> Result<()> {
        self.db.delete_workout(&self.user_id, id)
    }

    /// Record a completed session of an existing workout. Every planned set
    /// of the template is logged as completed.
    pub fn complete_workout(
        &self,
        workout_id: &str,
        duration: i64,
        notes: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<WorkoutLog> {
        if duration < 0 {
            bail!("Duration must not be negative");
        }
        let workout = self.db.get_workout(&self.user_id, workout_id)?;
        let exercise_logs = workout
            .exercises
            .iter()
            .map(|e| ExerciseLog {
                exercise_id: e.id.clone(),
                name: e.name.clone(),
                sets: (0..e.sets)
                    .map(|_| SetLog {
                        reps: e.reps,
                        weight: e.weight,
                        completed: true,
                    })
                    .collect(),
                is_bodyweight: e.is_bodyweight,
            })
            .collect();
        self.db.insert_workout_log(
            &self.user_id,
            &NewWorkoutLog {
                workout_id: workout.id,
                workout_name: workout.name,
                completed_at,
                duration,
                exercise_logs,
                notes,
            },
        )
    }

    pub fn workout_logs(&self) -> Result<Vec<WorkoutLog>> {
        self.db.get_workout_logs(&self.user_id)
    }

    // --- Weight ---

    pub fn log_weight(&self, weight: f64, date: &str) -> Result<WeightEntry> {
        if weight <= 0.0 {
            bail!("Weight must be positive");
        }
        let date = crate::models::validate_date(date)?;
        self.db.insert_weight_entry(
            &self.user_id,
            &NewWeightEntry {
                weight,
                date: date.format("%Y-%m-%d").to_string(),
            },
        )
    }

    pub fn weight_history(&self) -> Result<Vec<WeightEntry>> {
        self.db.get_weight_entries(&self.user_id)
    }

    // --- Meals ---

    pub fn list_meals(&self) -> Result<Vec<Meal>> {
        self.db.get_meals(&self.user_id)
    }

    pub fn add_meal(
        &self,
        name: &str,
        ingredients: Vec<MealIngredient>,
        total_servings: i64,
    ) -> Result<Meal> {
        let mut meal = NewMeal {
            name: name.trim().to_string(),
            ingredients,
            total_servings,
        };
        crate::models::validate_new_meal(&meal)?;
        for ingredient in &mut meal.ingredients {
            if ingredient.id.is_empty() {
                ingredient.id = Uuid::new_v4().to_string();
            }
        }
        self.db.insert_meal(&self.user_id, &meal)
    }

    pub fn get_meal(&self, id: &str) -> Result<Meal> {
        self.db.get_meal(&self.user_id, id)
    }

    pub fn delete_meal(&self, id: &str) -> Result<()> {
        self.db.delete_meal(&self.user_id, id)
    }
}
