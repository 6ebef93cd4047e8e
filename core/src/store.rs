use anyhow::Result;

use crate::db::Database;
use crate::models::{
    Food, FoodEntry, Goals, Meal, NewFood, NewFoodEntry, NewMeal, NewWeightEntry, NewWorkout,
    NewWorkoutLog, Profile, WeightEntry, Workout, WorkoutLog,
};

/// Per-user record persistence used by backup export and import.
///
/// Every record a `create_*` call returns carries a freshly generated id.
/// Implementations are free to be non-transactional: the import engine
/// never assumes earlier writes can be rolled back.
pub trait RecordStore {
    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;
    fn upsert_profile(&self, user_id: &str, profile: &Profile) -> Result<Profile>;

    fn get_goals(&self, user_id: &str) -> Result<Option<Goals>>;
    fn upsert_goals(&self, user_id: &str, goals: &Goals) -> Result<Goals>;

    fn list_workouts(&self, user_id: &str) -> Result<Vec<Workout>>;
    fn create_workout(&self, user_id: &str, workout: &NewWorkout) -> Result<Workout>;

    fn list_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>>;
    fn create_workout_log(&self, user_id: &str, log: &NewWorkoutLog) -> Result<WorkoutLog>;

    fn list_foods(&self, user_id: &str) -> Result<Vec<Food>>;
    fn create_food(&self, user_id: &str, food: &NewFood) -> Result<Food>;

    fn list_food_entries(&self, user_id: &str) -> Result<Vec<FoodEntry>>;
    fn create_food_entry(&self, user_id: &str, entry: &NewFoodEntry) -> Result<FoodEntry>;

    fn list_weight_entries(&self, user_id: &str) -> Result<Vec<WeightEntry>>;
    fn create_weight_entry(&self, user_id: &str, entry: &NewWeightEntry) -> Result<WeightEntry>;

    fn list_meals(&self, user_id: &str) -> Result<Vec<Meal>>;
    fn create_meal(&self, user_id: &str, meal: &NewMeal) -> Result<Meal>;
}

impl RecordStore for Database {
    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        Database::get_profile(self, user_id)
    }

    fn upsert_profile(&self, user_id: &str, profile: &Profile) -> Result<Profile> {
        self.update_profile(user_id, profile)
    }

    fn get_goals(&self, user_id: &str) -> Result<Option<Goals>> {
        Database::get_goals(self, user_id)
    }

    fn upsert_goals(&self, user_id: &str, goals: &Goals) -> Result<Goals> {
        Database::upsert_goals(self, user_id, goals)
    }

    fn list_workouts(&self, user_id: &str) -> Result<Vec<Workout>> {
        self.get_workouts(user_id)
    }

    fn create_workout(&self, user_id: &str, workout: &NewWorkout) -> Result<Workout> {
        self.insert_workout(user_id, workout)
    }

    fn list_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>> {
        self.get_workout_logs(user_id)
    }

    fn create_workout_log(&self, user_id: &str, log: &NewWorkoutLog) -> Result<WorkoutLog> {
        self.insert_workout_log(user_id, log)
    }

    fn list_foods(&self, user_id: &str) -> Result<Vec<Food>> {
        self.get_foods(user_id)
    }

    fn create_food(&self, user_id: &str, food: &NewFood) -> Result<Food> {
        self.insert_food(user_id, food)
    }

    fn list_food_entries(&self, user_id: &str) -> Result<Vec<FoodEntry>> {
        self.get_food_entries(user_id, None)
    }

    fn create_food_entry(&self, user_id: &str, entry: &NewFoodEntry) -> Result<FoodEntry> {
        self.insert_food_entry(user_id, entry)
    }

    fn list_weight_entries(&self, user_id: &str) -> Result<Vec<WeightEntry>> {
        self.get_weight_entries(user_id)
    }

    fn create_weight_entry(&self, user_id: &str, entry: &NewWeightEntry) -> Result<WeightEntry> {
        self.insert_weight_entry(user_id, entry)
    }

    fn list_meals(&self, user_id: &str) -> Result<Vec<Meal>> {
        self.get_meals(user_id)
    }

    fn create_meal(&self, user_id: &str, meal: &NewMeal) -> Result<Meal> {
        self.insert_meal(user_id, meal)
    }
}
