use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

pub const UNIT_SYSTEMS: &[&str] = &["metric", "imperial"];

pub const AVATARS: &[&str] = &[
    "mercury", "venus", "earth", "mars", "jupiter", "saturn", "uranus", "neptune",
];

pub const DEFAULT_WORKOUT_COLOR: &str = "#7B68EE";

// --- Profile / goals (singletons per user) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub avatar: String,
    pub units: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "User".to_string(),
            avatar: "earth".to_string(),
            units: "imperial".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Goals {
    pub daily_calories: i64,
    pub daily_protein: i64,
    pub daily_carbs: i64,
    pub daily_fats: i64,
    pub weekly_workouts: i64,
    pub target_weight: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily_calories: 2200,
            daily_protein: 150,
            daily_carbs: 250,
            daily_fats: 70,
            weekly_workouts: 4,
            target_weight: 160.0,
        }
    }
}

// --- Workouts ---

/// Snapshot exercises are free-form JSON; missing fields read as zero or empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sets: i64,
    #[serde(default)]
    pub reps: i64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bodyweight: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
    #[serde(default)]
    pub reps: i64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    #[serde(default)]
    pub exercise_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bodyweight: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub scheduled_days: Vec<u8>,
    pub color: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub scheduled_days: Vec<u8>,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    pub id: String,
    /// Empty when the originating workout could not be resolved.
    pub workout_id: String,
    pub workout_name: String,
    pub completed_at: String,
    pub duration: i64,
    pub exercise_logs: Vec<ExerciseLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWorkoutLog {
    pub workout_id: String,
    pub workout_name: String,
    pub completed_at: DateTime<Utc>,
    pub duration: i64,
    pub exercise_logs: Vec<ExerciseLog>,
    pub notes: Option<String>,
}

// --- Nutrition ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: String,
    pub name: String,
    pub serving_size: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
    pub is_saved: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub serving_size: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
    pub is_saved: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: String,
    pub food_id: String,
    pub meal_type: String,
    pub servings: f64,
    pub date: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewFoodEntry {
    pub food_id: String,
    pub meal_type: String,
    pub servings: f64,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    pub id: String,
    pub weight: f64,
    pub date: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewWeightEntry {
    pub weight: f64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealIngredient {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    #[serde(default)]
    pub fiber: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<MealIngredient>,
    pub total_servings: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub name: String,
    pub ingredients: Vec<MealIngredient>,
    pub total_servings: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MealNutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
}

impl Meal {
    /// Sum of every ingredient's nutrition for the whole batch.
    #[must_use]
    pub fn total_nutrition(&self) -> MealNutrition {
        self.ingredients
            .iter()
            .fold(MealNutrition::default(), |acc, ing| MealNutrition {
                calories: acc.calories + ing.calories,
                protein: acc.protein + ing.protein,
                carbs: acc.carbs + ing.carbs,
                fats: acc.fats + ing.fats,
                fiber: acc.fiber + ing.fiber,
            })
    }

    /// Batch totals divided by the serving count (a non-positive count is treated as 1).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn nutrition_per_serving(&self) -> MealNutrition {
        let total = self.total_nutrition();
        let servings = if self.total_servings > 0 {
            self.total_servings as f64
        } else {
            1.0
        };
        MealNutrition {
            calories: total.calories / servings,
            protein: total.protein / servings,
            carbs: total.carbs / servings,
            fats: total.fats / servings,
            fiber: total.fiber / servings,
        }
    }
}

// --- Backup snapshot types ---

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Any truthy JSON value marks a usable snapshot; see `backup::check_version`.
    #[serde(default)]
    pub version: Option<serde_json::Value>,
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub goals: Option<Goals>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workouts: Vec<SnapshotWorkout>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workout_logs: Vec<SnapshotWorkoutLog>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub foods: Vec<SnapshotFood>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub food_entries: Vec<SnapshotFoodEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight_entries: Vec<SnapshotWeightEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meals: Vec<SnapshotMeal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotWorkout {
    #[serde(default)]
    pub export_id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exercises: Vec<Exercise>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scheduled_days: Vec<u8>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotWorkoutLog {
    #[serde(default)]
    pub workout_export_id: Option<String>,
    pub workout_name: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exercise_logs: Vec<ExerciseLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFood {
    #[serde(default)]
    pub export_id: Option<String>,
    pub name: String,
    pub serving_size: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub is_saved: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Nutrition copied from the referenced food at export time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSnapshot {
    pub name: String,
    pub serving_size: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    #[serde(default)]
    pub fiber: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFoodEntry {
    #[serde(default)]
    pub food_export_id: Option<String>,
    pub meal_type: String,
    #[serde(default)]
    pub servings: Option<f64>,
    pub date: String,
    #[serde(default)]
    pub food_snapshot: Option<FoodSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotWeightEntry {
    pub weight: f64,
    pub date: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeal {
    #[serde(default)]
    pub export_id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<MealIngredient>,
    #[serde(default)]
    pub total_servings: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Number of records newly inserted by one import, per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub workouts: i64,
    pub workout_logs: i64,
    pub foods: i64,
    pub food_entries: i64,
    pub weight_entries: i64,
    pub meals: i64,
}

// --- Validation ---

pub fn validate_meal_type(meal: &str) -> Result<String> {
    let lower = meal.to_lowercase();
    if MEAL_TYPES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid meal type '{meal}'. Must be one of: {}",
            MEAL_TYPES.join(", ")
        )
    }
}

pub fn validate_units(units: &str) -> Result<String> {
    let lower = units.to_lowercase();
    if UNIT_SYSTEMS.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid units '{units}'. Must be one of: {}",
            UNIT_SYSTEMS.join(", ")
        )
    }
}

pub fn validate_avatar(avatar: &str) -> Result<String> {
    let lower = avatar.to_lowercase();
    if AVATARS.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid avatar '{avatar}'. Must be one of: {}",
            AVATARS.join(", ")
        )
    }
}

/// Weekday indices run from 0 (Sunday) to 6 (Saturday).
pub fn validate_scheduled_days(days: &[u8]) -> Result<()> {
    if let Some(day) = days.iter().find(|d| **d > 6) {
        bail!("Scheduled day {day} out of range. Must be between 0 and 6");
    }
    Ok(())
}

pub fn validate_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{date}'. Must be YYYY-MM-DD"))
}

/// Validate a food before it is created: name must not be empty, nutrition must not be negative.
pub fn validate_new_food(food: &NewFood) -> Result<()> {
    if food.name.trim().is_empty() {
        bail!("Food name must not be empty");
    }
    if food.calories < 0 {
        bail!("calories must not be negative");
    }
    for (label, value) in [
        ("protein", food.protein),
        ("carbs", food.carbs),
        ("fats", food.fats),
        ("fiber", food.fiber),
    ] {
        if value < 0.0 {
            bail!("{label} must not be negative");
        }
    }
    Ok(())
}

/// Validate a meal before it is created.
pub fn validate_new_meal(meal: &NewMeal) -> Result<()> {
    if meal.name.trim().is_empty() {
        bail!("Meal name must not be empty");
    }
    if meal.total_servings < 1 {
        bail!("Total servings must be at least 1");
    }
    for ingredient in &meal.ingredients {
        if ingredient.name.trim().is_empty() {
            bail!("Ingredient name must not be empty");
        }
        for (label, value) in [
            ("amount", ingredient.amount),
            ("calories", ingredient.calories),
            ("protein", ingredient.protein),
            ("carbs", ingredient.carbs),
            ("fats", ingredient.fats),
            ("fiber", ingredient.fiber),
        ] {
            if value < 0.0 {
                bail!("{} {label} must not be negative", ingredient.name);
            }
        }
    }
    Ok(())
}
