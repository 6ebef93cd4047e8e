use anyhow::Result;

use stride_core::models::NewFood;
use stride_core::service::StrideService;

use super::helpers::print_food_table;

pub(crate) struct FoodInput {
    pub name: String,
    pub serving: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
}

pub(crate) fn cmd_food_add(svc: &StrideService, input: FoodInput, json: bool) -> Result<()> {
    let food = svc.add_food(&NewFood {
        name: input.name,
        serving_size: input.serving,
        calories: input.calories,
        protein: input.protein,
        carbs: input.carbs,
        fats: input.fats,
        fiber: input.fiber,
        is_saved: true,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        println!("Added food: {} (id: {})", food.name, food.id);
    }

    Ok(())
}

pub(crate) fn cmd_food_list(svc: &StrideService, all: bool, json: bool) -> Result<()> {
    let foods = svc.list_foods(!all)?;

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found. Use `stride food add` to create one.");
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(&foods);
    }

    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &StrideService, id: &str, json: bool) -> Result<()> {
    let food = svc.get_food(id)?;
    let logged = svc
        .food_entries(None)?
        .iter()
        .filter(|e| e.food_id == food.id)
        .count();
    svc.delete_food(&food.id)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": food.id, "entriesDeleted": logged })
        );
    } else {
        println!("Deleted food {} ({logged} log entries removed)", food.name);
    }

    Ok(())
}
