mod backup;
mod food;
mod helpers;
mod log;
mod meal;
mod profile;
mod weight;
mod workout;

pub(crate) use backup::{cmd_export, cmd_import};
pub(crate) use food::{FoodInput, cmd_food_add, cmd_food_delete, cmd_food_list};
pub(crate) use log::{cmd_delete, cmd_entries, cmd_log};
pub(crate) use meal::{cmd_meal_add, cmd_meal_delete, cmd_meal_list, cmd_meal_show};
pub(crate) use profile::{
    GoalsUpdate, cmd_goals_set, cmd_goals_show, cmd_profile_set, cmd_profile_show,
};
pub(crate) use weight::{cmd_weight_history, cmd_weight_log};
pub(crate) use workout::{
    cmd_workout_add, cmd_workout_delete, cmd_workout_done, cmd_workout_history, cmd_workout_list,
};
