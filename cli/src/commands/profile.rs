use anyhow::Result;

use stride_core::models::Goals;
use stride_core::service::StrideService;

pub(crate) fn cmd_profile_show(svc: &StrideService, json: bool) -> Result<()> {
    let profile = svc.get_profile()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Name:   {}", profile.name);
        println!("Avatar: {}", profile.avatar);
        println!("Units:  {}", profile.units);
    }

    Ok(())
}

pub(crate) fn cmd_profile_set(
    svc: &StrideService,
    name: Option<&str>,
    avatar: Option<&str>,
    units: Option<&str>,
    json: bool,
) -> Result<()> {
    let profile = svc.update_profile(name, avatar, units)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!(
            "Profile updated: {} ({}, {})",
            profile.name, profile.avatar, profile.units
        );
    }

    Ok(())
}

pub(crate) fn cmd_goals_show(svc: &StrideService, json: bool) -> Result<()> {
    let goals = svc.get_goals()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        print_goals(&goals);
    }

    Ok(())
}

/// Fields left as `None` keep their current value.
pub(crate) struct GoalsUpdate {
    pub calories: Option<i64>,
    pub protein: Option<i64>,
    pub carbs: Option<i64>,
    pub fats: Option<i64>,
    pub workouts: Option<i64>,
    pub target_weight: Option<f64>,
}

pub(crate) fn cmd_goals_set(svc: &StrideService, update: &GoalsUpdate, json: bool) -> Result<()> {
    let current = svc.get_goals()?;
    let goals = svc.set_goals(&Goals {
        daily_calories: update.calories.unwrap_or(current.daily_calories),
        daily_protein: update.protein.unwrap_or(current.daily_protein),
        daily_carbs: update.carbs.unwrap_or(current.daily_carbs),
        daily_fats: update.fats.unwrap_or(current.daily_fats),
        weekly_workouts: update.workouts.unwrap_or(current.weekly_workouts),
        target_weight: update.target_weight.unwrap_or(current.target_weight),
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        println!("Goals updated.\n");
        print_goals(&goals);
    }

    Ok(())
}

fn print_goals(goals: &Goals) {
    println!("  Calories:        {} kcal/day", goals.daily_calories);
    println!("  Protein:         {} g/day", goals.daily_protein);
    println!("  Carbs:           {} g/day", goals.daily_carbs);
    println!("  Fats:            {} g/day", goals.daily_fats);
    println!("  Workouts:        {} /week", goals.weekly_workouts);
    println!("  Target weight:   {:.1}", goals.target_weight);
}
