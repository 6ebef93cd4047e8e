use std::path::Path;

use anyhow::{Context, Result};

use stride_core::service::StrideService;

pub(crate) fn cmd_export(svc: &StrideService, output: Option<&Path>) -> Result<()> {
    let snapshot = svc.export_backup()?;
    let body = serde_json::to_string_pretty(&snapshot)?;

    if let Some(path) = output {
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write backup: {}", path.display()))?;
        eprintln!(
            "Exported {} foods, {} food entries, {} workouts, {} workout logs, {} weight entries, {} meals to {}",
            snapshot.foods.len(),
            snapshot.food_entries.len(),
            snapshot.workouts.len(),
            snapshot.workout_logs.len(),
            snapshot.weight_entries.len(),
            snapshot.meals.len(),
            path.display()
        );
    } else {
        println!("{body}");
    }

    Ok(())
}

pub(crate) fn cmd_import(svc: &StrideService, path: &Path, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let counts = svc.import_backup_json(&raw)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "message": "Backup imported successfully",
                "imported": counts,
            })
        );
    } else {
        println!("Import complete.\n");
        println!("  Workouts:       {}", counts.workouts);
        println!("  Workout logs:   {}", counts.workout_logs);
        println!("  Foods:          {}", counts.foods);
        println!("  Food entries:   {}", counts.food_entries);
        println!("  Weight entries: {}", counts.weight_entries);
        println!("  Meals:          {}", counts.meals);
    }

    Ok(())
}
