use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use stride_core::service::StrideService;

use super::helpers::{parse_ingredient, truncate};

pub(crate) fn cmd_meal_add(
    svc: &StrideService,
    name: &str,
    ingredients: &[String],
    servings: i64,
    json: bool,
) -> Result<()> {
    let ingredients = ingredients
        .iter()
        .map(|i| parse_ingredient(i))
        .collect::<Result<Vec<_>>>()?;
    let meal = svc.add_meal(name, ingredients, servings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        println!(
            "Added meal: {} (id: {}, {:.0} kcal per serving)",
            meal.name,
            meal.id,
            meal.nutrition_per_serving().calories
        );
    }

    Ok(())
}

pub(crate) fn cmd_meal_delete(svc: &StrideService, id: &str, json: bool) -> Result<()> {
    svc.delete_meal(id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted meal {id}");
    }
    Ok(())
}

pub(crate) fn cmd_meal_list(svc: &StrideService, json: bool) -> Result<()> {
    let meals = svc.list_meals()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
        return Ok(());
    }
    if meals.is_empty() {
        eprintln!("No meals saved. Use `stride meal add` to create one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
        #[tabled(rename = "Servings")]
        servings: i64,
        #[tabled(rename = "Cal/serving")]
        calories: String,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            id: m.id.clone(),
            name: truncate(&m.name, 30),
            ingredients: m.ingredients.len(),
            servings: m.total_servings,
            calories: format!("{:.0}", m.nutrition_per_serving().calories),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_meal_show(svc: &StrideService, id: &str, json: bool) -> Result<()> {
    let meal = svc.get_meal(id)?;
    let per_serving = meal.nutrition_per_serving();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "meal": meal,
                "total": meal.total_nutrition(),
                "perServing": per_serving,
            })
        );
        return Ok(());
    }

    println!("{} ({} servings)\n", meal.name, meal.total_servings);

    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fats: String,
    }

    let rows: Vec<IngredientRow> = meal
        .ingredients
        .iter()
        .map(|i| IngredientRow {
            name: truncate(&i.name, 30),
            amount: format!("{} {}", i.amount, i.unit),
            calories: format!("{:.0}", i.calories),
            protein: format!("{:.1}", i.protein),
            carbs: format!("{:.1}", i.carbs),
            fats: format!("{:.1}", i.fats),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!(
        "\nPer serving: {:.0} kcal, {:.1}g protein, {:.1}g carbs, {:.1}g fats, {:.1}g fiber",
        per_serving.calories,
        per_serving.protein,
        per_serving.carbs,
        per_serving.fats,
        per_serving.fiber
    );

    Ok(())
}
