use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use stride_core::service::StrideService;

use super::helpers::{date_string, truncate};

pub(crate) fn cmd_log(
    svc: &StrideService,
    food_id: &str,
    servings: f64,
    meal: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = date_string(date)?;
    let entry = svc.log_food(food_id, servings, meal, &date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let food = svc.get_food(&entry.food_id)?;
        #[allow(clippy::cast_precision_loss)]
        let calories = food.calories as f64 * entry.servings;
        println!(
            "Logged {} x {} ({}) to {} on {} ({calories:.0} kcal)",
            entry.servings, food.name, food.serving_size, entry.meal_type, entry.date
        );
    }

    Ok(())
}

/// Show the food log for one day.
pub(crate) fn cmd_entries(svc: &StrideService, date: Option<String>, json: bool) -> Result<()> {
    let date = date_string(date)?;
    let entries = svc.food_entries(Some(&date))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        eprintln!("Nothing logged on {date}.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Servings")]
        servings: String,
        #[tabled(rename = "Cal")]
        calories: String,
    }

    let mut total = 0.0;
    let mut rows = Vec::with_capacity(entries.len());
    for entry in &entries {
        let food = svc.get_food(&entry.food_id)?;
        #[allow(clippy::cast_precision_loss)]
        let calories = food.calories as f64 * entry.servings;
        total += calories;
        rows.push(EntryRow {
            id: entry.id.clone(),
            meal: entry.meal_type.clone(),
            food: truncate(&food.name, 35),
            servings: format!("{:.2}", entry.servings),
            calories: format!("{calories:.0}"),
        });
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{date}");
    println!("{table}");
    println!("Total: {total:.0} kcal");

    Ok(())
}

pub(crate) fn cmd_delete(svc: &StrideService, entry_id: &str, json: bool) -> Result<()> {
    svc.delete_food_entry(entry_id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": entry_id }));
    } else {
        println!("Deleted entry {entry_id}");
    }
    Ok(())
}
