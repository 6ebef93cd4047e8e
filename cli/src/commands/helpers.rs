use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveDate};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use stride_core::models::{Exercise, Food, MealIngredient};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// `YYYY-MM-DD` form of [`parse_date`], the format records store dates in.
pub(crate) fn date_string(date_str: Option<String>) -> Result<String> {
    Ok(parse_date(date_str)?.format("%Y-%m-%d").to_string())
}

/// Parse a comma-separated weekday list such as "1,3,5" (0 = Sunday).
pub(crate) fn parse_days(s: &str) -> Result<Vec<u8>> {
    s.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse::<u8>()
                .with_context(|| format!("Invalid day '{d}'. Use numbers 0 (Sun) to 6 (Sat)"))
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str, spec: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .ok()
        .with_context(|| format!("Invalid {field} '{value}' in '{spec}'"))
}

/// Parse `NAME:SETS:REPS[:WEIGHT]`, e.g. "Bench Press:3:8:135". Weight defaults to 0.
pub(crate) fn parse_exercise(s: &str) -> Result<Exercise> {
    let parts: Vec<&str> = s.split(':').collect();
    if !(3..=4).contains(&parts.len()) || parts[0].trim().is_empty() {
        bail!("Invalid exercise '{s}'. Use 'name:sets:reps[:weight]' (e.g. 'Squat:5:5:225')");
    }
    Ok(Exercise {
        id: String::new(),
        name: parts[0].trim().to_string(),
        sets: parse_number("sets", parts[1], s)?,
        reps: parse_number("reps", parts[2], s)?,
        weight: parts
            .get(3)
            .map(|w| parse_number("weight", w, s))
            .transpose()?
            .unwrap_or(0.0),
        is_bodyweight: None,
        notes: None,
    })
}

/// Parse `NAME:AMOUNT:UNIT:CAL:PROTEIN:CARBS:FATS[:FIBER]`, e.g. "Oats:80:g:300:10:54:6:8".
pub(crate) fn parse_ingredient(s: &str) -> Result<MealIngredient> {
    let parts: Vec<&str> = s.split(':').collect();
    if !(7..=8).contains(&parts.len()) || parts[0].trim().is_empty() {
        bail!(
            "Invalid ingredient '{s}'. Use 'name:amount:unit:cal:protein:carbs:fats[:fiber]'"
        );
    }
    Ok(MealIngredient {
        id: String::new(),
        name: parts[0].trim().to_string(),
        amount: parse_number("amount", parts[1], s)?,
        unit: parts[2].trim().to_string(),
        calories: parse_number("calories", parts[3], s)?,
        protein: parse_number("protein", parts[4], s)?,
        carbs: parse_number("carbs", parts[5], s)?,
        fats: parse_number("fats", parts[6], s)?,
        fiber: parts
            .get(7)
            .map(|f| parse_number("fiber", f, s))
            .transpose()?
            .unwrap_or(0.0),
    })
}

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub(crate) fn format_days(days: &[u8]) -> String {
    days.iter()
        .filter_map(|d| DAY_NAMES.get(usize::from(*d)))
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a stored RFC 3339 timestamp in local time, falling back to the raw text.
pub(crate) fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

pub(crate) fn print_food_table(foods: &[Food]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Cal")]
        calories: i64,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fats: String,
        #[tabled(rename = "Saved")]
        saved: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| FoodRow {
            id: f.id.clone(),
            name: truncate(&f.name, 35),
            serving: truncate(&f.serving_size, 15),
            calories: f.calories,
            protein: format!("{:.1}", f.protein),
            carbs: format!("{:.1}", f.carbs),
            fats: format!("{:.1}", f.fats),
            saved: if f.is_saved { "yes" } else { "no" }.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
