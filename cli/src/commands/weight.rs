use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use stride_core::service::StrideService;

use super::helpers::date_string;

pub(crate) fn cmd_weight_log(
    svc: &StrideService,
    value: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = date_string(date)?;
    let entry = svc.log_weight(value, &date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let units = if svc.get_profile()?.units == "metric" {
            "kg"
        } else {
            "lbs"
        };
        println!("Logged {:.1} {units} for {}", entry.weight, entry.date);
    }

    Ok(())
}

pub(crate) fn cmd_weight_history(svc: &StrideService, json: bool) -> Result<()> {
    let entries = svc.weight_history()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No weight entries found. Use `stride weight log` to record your weight.");
    } else {
        #[derive(Tabled)]
        struct WeightRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Weight")]
            weight: String,
            #[tabled(rename = "Change")]
            change: String,
        }

        let mut previous: Option<f64> = None;
        let rows: Vec<WeightRow> = entries
            .iter()
            .map(|e| {
                let change = previous.map_or_else(String::new, |p| format!("{:+.1}", e.weight - p));
                previous = Some(e.weight);
                WeightRow {
                    date: e.date.clone(),
                    weight: format!("{:.1}", e.weight),
                    change,
                }
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}
