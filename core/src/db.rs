use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params, types::Type};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::models::{
    Food, FoodEntry, Goals, Meal, NewFood, NewFoodEntry, NewMeal, NewWeightEntry, NewWorkout,
    NewWorkoutLog, Profile, WeightEntry, Workout, WorkoutLog,
};

pub struct Database {
    conn: Connection,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Decode a JSON text column into a typed value.
fn json_column<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL DEFAULT 'User',
                    avatar TEXT NOT NULL DEFAULT 'earth',
                    units TEXT NOT NULL DEFAULT 'imperial',
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS user_goals (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                    daily_calories INTEGER NOT NULL DEFAULT 2200,
                    daily_protein INTEGER NOT NULL DEFAULT 150,
                    daily_carbs INTEGER NOT NULL DEFAULT 250,
                    daily_fats INTEGER NOT NULL DEFAULT 70,
                    weekly_workouts INTEGER NOT NULL DEFAULT 4,
                    target_weight REAL NOT NULL DEFAULT 160
                );

                CREATE TABLE IF NOT EXISTS workouts (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    exercises TEXT NOT NULL DEFAULT '[]',
                    scheduled_days TEXT NOT NULL DEFAULT '[]',
                    color TEXT NOT NULL DEFAULT '#7B68EE',
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS workout_logs (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    workout_id TEXT NOT NULL,
                    workout_name TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    duration INTEGER NOT NULL DEFAULT 0,
                    exercise_logs TEXT NOT NULL DEFAULT '[]',
                    notes TEXT
                );

                CREATE TABLE IF NOT EXISTS foods (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    serving_size TEXT NOT NULL,
                    calories INTEGER NOT NULL,
                    protein REAL NOT NULL,
                    carbs REAL NOT NULL,
                    fats REAL NOT NULL,
                    fiber REAL NOT NULL DEFAULT 0,
                    is_saved INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS food_entries (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    food_id TEXT NOT NULL REFERENCES foods(id) ON DELETE CASCADE,
                    meal_type TEXT NOT NULL,
                    servings REAL NOT NULL DEFAULT 1,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS weight_entries (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    weight REAL NOT NULL,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meals (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    ingredients TEXT NOT NULL DEFAULT '[]',
                    total_servings INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_workouts_user ON workouts(user_id);
                CREATE INDEX IF NOT EXISTS idx_workout_logs_user ON workout_logs(user_id);
                CREATE INDEX IF NOT EXISTS idx_foods_user ON foods(user_id);
                CREATE INDEX IF NOT EXISTS idx_food_entries_user_date ON food_entries(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_weight_entries_user ON weight_entries(user_id);
                CREATE INDEX IF NOT EXISTS idx_meals_user ON meals(user_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn workout_from_row(row: &rusqlite::Row) -> rusqlite::Result<Workout> {
        Ok(Workout {
            id: row.get(0)?,
            name: row.get(1)?,
            exercises: json_column(row, 2)?,
            scheduled_days: json_column(row, 3)?,
            color: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn workout_log_from_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutLog> {
        Ok(WorkoutLog {
            id: row.get(0)?,
            workout_id: row.get(1)?,
            workout_name: row.get(2)?,
            completed_at: row.get(3)?,
            duration: row.get(4)?,
            exercise_logs: json_column(row, 5)?,
            notes: row.get(6)?,
        })
    }

    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<Food> {
        Ok(Food {
            id: row.get(0)?,
            name: row.get(1)?,
            serving_size: row.get(2)?,
            calories: row.get(3)?,
            protein: row.get(4)?,
            carbs: row.get(5)?,
            fats: row.get(6)?,
            fiber: row.get(7)?,
            is_saved: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn food_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodEntry> {
        Ok(FoodEntry {
            id: row.get(0)?,
            food_id: row.get(1)?,
            meal_type: row.get(2)?,
            servings: row.get(3)?,
            date: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn weight_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeightEntry> {
        Ok(WeightEntry {
            id: row.get(0)?,
            weight: row.get(1)?,
            date: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Meal> {
        Ok(Meal {
            id: row.get(0)?,
            name: row.get(1)?,
            ingredients: json_column(row, 2)?,
            total_servings: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    // --- Users / profile ---

    /// Create the user row with default profile fields if it does not exist yet.
    pub fn ensure_user(&self, user_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)",
            params![user_id, now()],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT name, avatar, units FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(Profile {
                        name: row.get(0)?,
                        avatar: row.get(1)?,
                        units: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    pub fn update_profile(&self, user_id: &str, profile: &Profile) -> Result<Profile> {
        self.conn.execute(
            "INSERT INTO users (id, name, avatar, units, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name,
                 avatar = excluded.avatar, units = excluded.units",
            params![user_id, profile.name, profile.avatar, profile.units, now()],
        )?;
        self.get_profile(user_id)?
            .context("Profile missing after update")
    }

    // --- Goals ---

    pub fn get_goals(&self, user_id: &str) -> Result<Option<Goals>> {
        let goals = self
            .conn
            .query_row(
                "SELECT daily_calories, daily_protein, daily_carbs, daily_fats,
                        weekly_workouts, target_weight
                 FROM user_goals WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Goals {
                        daily_calories: row.get(0)?,
                        daily_protein: row.get(1)?,
                        daily_carbs: row.get(2)?,
                        daily_fats: row.get(3)?,
                        weekly_workouts: row.get(4)?,
                        target_weight: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(goals)
    }

    pub fn upsert_goals(&self, user_id: &str, goals: &Goals) -> Result<Goals> {
        self.conn.execute(
            "INSERT INTO user_goals (id, user_id, daily_calories, daily_protein, daily_carbs,
                                     daily_fats, weekly_workouts, target_weight)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id) DO UPDATE SET
                 daily_calories = excluded.daily_calories,
                 daily_protein = excluded.daily_protein,
                 daily_carbs = excluded.daily_carbs,
                 daily_fats = excluded.daily_fats,
                 weekly_workouts = excluded.weekly_workouts,
                 target_weight = excluded.target_weight",
            params![
                new_id(),
                user_id,
                goals.daily_calories,
                goals.daily_protein,
                goals.daily_carbs,
                goals.daily_fats,
                goals.weekly_workouts,
                goals.target_weight,
            ],
        )?;
        self.get_goals(user_id)?.context("Goals missing after upsert")
    }

    // --- Workouts ---

    pub fn insert_workout(&self, user_id: &str, workout: &NewWorkout) -> Result<Workout> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO workouts (id, user_id, name, exercises, scheduled_days, color, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                user_id,
                workout.name,
                serde_json::to_string(&workout.exercises)?,
                serde_json::to_string(&workout.scheduled_days)?,
                workout.color,
                now(),
            ],
        )?;
        self.get_workout(user_id, &id)
    }

    /// Lookups are scoped to the owning user; another user's id reads as not found.
    pub fn get_workout(&self, user_id: &str, id: &str) -> Result<Workout> {
        self.conn
            .query_row(
                "SELECT id, name, exercises, scheduled_days, color, created_at
                 FROM workouts WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                Self::workout_from_row,
            )
            .context("Workout not found")
    }

    /// Completed sessions keep their `workout_id`; history outlives the template.
    pub fn delete_workout(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM workouts WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if rows == 0 {
            anyhow::bail!("Workout not found");
        }
        Ok(())
    }

    pub fn get_workouts(&self, user_id: &str) -> Result<Vec<Workout>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, exercises, scheduled_days, color, created_at
             FROM workouts WHERE user_id = ?1 ORDER BY created_at, rowid",
        )?;
        let workouts = stmt
            .query_map(params![user_id], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    // --- Workout logs ---

    pub fn insert_workout_log(&self, user_id: &str, log: &NewWorkoutLog) -> Result<WorkoutLog> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO workout_logs (id, user_id, workout_id, workout_name, completed_at,
                                       duration, exercise_logs, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                user_id,
                log.workout_id,
                log.workout_name,
                log.completed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                log.duration,
                serde_json::to_string(&log.exercise_logs)?,
                log.notes,
            ],
        )?;
        self.conn
            .query_row(
                "SELECT id, workout_id, workout_name, completed_at, duration, exercise_logs, notes
                 FROM workout_logs WHERE id = ?1",
                params![id],
                Self::workout_log_from_row,
            )
            .context("Workout log not found")
    }

    pub fn get_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, workout_id, workout_name, completed_at, duration, exercise_logs, notes
             FROM workout_logs WHERE user_id = ?1 ORDER BY completed_at, rowid",
        )?;
        let logs = stmt
            .query_map(params![user_id], Self::workout_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    // --- Foods ---

    pub fn insert_food(&self, user_id: &str, food: &NewFood) -> Result<Food> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO foods (id, user_id, name, serving_size, calories, protein, carbs, fats,
                                fiber, is_saved, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                id,
                user_id,
                food.name,
                food.serving_size,
                food.calories,
                food.protein,
                food.carbs,
                food.fats,
                food.fiber,
                food.is_saved,
                now(),
            ],
        )?;
        self.get_food(user_id, &id)
    }

    pub fn get_food(&self, user_id: &str, id: &str) -> Result<Food> {
        self.conn
            .query_row(
                "SELECT id, name, serving_size, calories, protein, carbs, fats, fiber, is_saved,
                        created_at
                 FROM foods WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                Self::food_from_row,
            )
            .context("Food not found")
    }

    /// Removes the food and every entry logged against it.
    pub fn delete_food(&self, user_id: &str, id: &str) -> Result<()> {
        self.get_food(user_id, id)?;
        self.conn.execute(
            "DELETE FROM food_entries WHERE food_id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        self.conn.execute(
            "DELETE FROM foods WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(())
    }

    pub fn get_foods(&self, user_id: &str) -> Result<Vec<Food>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, serving_size, calories, protein, carbs, fats, fiber, is_saved,
                    created_at
             FROM foods WHERE user_id = ?1 ORDER BY created_at, rowid",
        )?;
        let foods = stmt
            .query_map(params![user_id], Self::food_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    // --- Food entries ---

    pub fn insert_food_entry(&self, user_id: &str, entry: &NewFoodEntry) -> Result<FoodEntry> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO food_entries (id, user_id, food_id, meal_type, servings, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                user_id,
                entry.food_id,
                entry.meal_type,
                entry.servings,
                entry.date,
                now(),
            ],
        )?;
        self.conn
            .query_row(
                "SELECT id, food_id, meal_type, servings, date, created_at
                 FROM food_entries WHERE id = ?1",
                params![id],
                Self::food_entry_from_row,
            )
            .context("Food entry not found")
    }

    /// All entries for a user, or only those on `date` when given.
    pub fn get_food_entries(&self, user_id: &str, date: Option<&str>) -> Result<Vec<FoodEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, food_id, meal_type, servings, date, created_at
             FROM food_entries
             WHERE user_id = ?1 AND (?2 IS NULL OR date = ?2)
             ORDER BY date, created_at, rowid",
        )?;
        let entries = stmt
            .query_map(params![user_id, date], Self::food_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_food_entry(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM food_entries WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if rows == 0 {
            anyhow::bail!("Food entry not found");
        }
        Ok(())
    }

    // --- Weight ---

    pub fn insert_weight_entry(
        &self,
        user_id: &str,
        entry: &NewWeightEntry,
    ) -> Result<WeightEntry> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO weight_entries (id, user_id, weight, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, user_id, entry.weight, entry.date, now()],
        )?;
        self.conn
            .query_row(
                "SELECT id, weight, date, created_at FROM weight_entries WHERE id = ?1",
                params![id],
                Self::weight_entry_from_row,
            )
            .context("Weight entry not found")
    }

    pub fn get_weight_entries(&self, user_id: &str) -> Result<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, weight, date, created_at
             FROM weight_entries WHERE user_id = ?1 ORDER BY date, rowid",
        )?;
        let entries = stmt
            .query_map(params![user_id], Self::weight_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // --- Meals ---

    pub fn insert_meal(&self, user_id: &str, meal: &NewMeal) -> Result<Meal> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO meals (id, user_id, name, ingredients, total_servings, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                user_id,
                meal.name,
                serde_json::to_string(&meal.ingredients)?,
                meal.total_servings,
                now(),
            ],
        )?;
        self.get_meal(user_id, &id)
    }

    pub fn get_meal(&self, user_id: &str, id: &str) -> Result<Meal> {
        self.conn
            .query_row(
                "SELECT id, name, ingredients, total_servings, created_at
                 FROM meals WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                Self::meal_from_row,
            )
            .context("Meal not found")
    }

    pub fn delete_meal(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM meals WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if rows == 0 {
            anyhow::bail!("Meal not found");
        }
        Ok(())
    }

    pub fn get_meals(&self, user_id: &str) -> Result<Vec<Meal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, ingredients, total_servings, created_at
             FROM meals WHERE user_id = ?1 ORDER BY created_at, rowid",
        )?;
        let meals = stmt
            .query_map(params![user_id], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }
}
