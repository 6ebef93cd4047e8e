use anyhow::Result;
use chrono::Utc;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use stride_core::service::StrideService;

use super::helpers::{format_days, format_timestamp, parse_days, parse_exercise, truncate};

pub(crate) fn cmd_workout_add(
    svc: &StrideService,
    name: &str,
    exercises: &[String],
    days: Option<&str>,
    color: Option<&str>,
    json: bool,
) -> Result<()> {
    let days = days.map(parse_days).transpose()?.unwrap_or_default();
    let exercises = exercises
        .iter()
        .map(|e| parse_exercise(e))
        .collect::<Result<Vec<_>>>()?;
    let workout = svc.add_workout(name, exercises, days, color)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workout)?);
    } else {
        println!("Added workout: {} (id: {})", workout.name, workout.id);
        for exercise in &workout.exercises {
            println!(
                "  {}: {} x {} @ {}",
                exercise.name, exercise.sets, exercise.reps, exercise.weight
            );
        }
        if !workout.scheduled_days.is_empty() {
            println!("  Scheduled: {}", format_days(&workout.scheduled_days));
        }
    }

    Ok(())
}

pub(crate) fn cmd_workout_delete(svc: &StrideService, id: &str, json: bool) -> Result<()> {
    svc.delete_workout(id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted workout {id} (completed sessions are kept)");
    }
    Ok(())
}

pub(crate) fn cmd_workout_list(svc: &StrideService, json: bool) -> Result<()> {
    let workouts = svc.list_workouts()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workouts)?);
        return Ok(());
    }
    if workouts.is_empty() {
        eprintln!("No workouts yet. Use `stride workout add` to create one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct WorkoutRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Exercises")]
        exercises: usize,
        #[tabled(rename = "Days")]
        days: String,
        #[tabled(rename = "Color")]
        color: String,
    }

    let rows: Vec<WorkoutRow> = workouts
        .iter()
        .map(|w| WorkoutRow {
            id: w.id.clone(),
            name: truncate(&w.name, 30),
            exercises: w.exercises.len(),
            days: format_days(&w.scheduled_days),
            color: w.color.clone(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(2)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_workout_done(
    svc: &StrideService,
    workout_id: &str,
    duration: i64,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let log = svc.complete_workout(workout_id, duration, notes, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
    } else {
        println!(
            "Logged {} ({} min) at {}",
            log.workout_name,
            log.duration,
            format_timestamp(&log.completed_at)
        );
    }

    Ok(())
}

pub(crate) fn cmd_workout_history(svc: &StrideService, json: bool) -> Result<()> {
    let logs = svc.workout_logs()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }
    if logs.is_empty() {
        eprintln!("No completed workouts yet.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct LogRow {
        #[tabled(rename = "Completed")]
        completed: String,
        #[tabled(rename = "Workout")]
        name: String,
        #[tabled(rename = "Minutes")]
        duration: i64,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<LogRow> = logs
        .iter()
        .map(|l| LogRow {
            completed: format_timestamp(&l.completed_at),
            name: truncate(&l.workout_name, 30),
            duration: l.duration,
            notes: l.notes.as_deref().map(|n| truncate(n, 40)).unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(2)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
